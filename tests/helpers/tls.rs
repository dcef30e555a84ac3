use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::hash::MessageDigest;
use boring::pkey::PKey;
use boring::rsa::Rsa;
use boring::ssl::{SslAcceptor, SslMethod, SslVersion};
use boring::x509::{X509NameBuilder, X509};

/// Self-signed certificate for 127.0.0.1/localhost.
///
/// Returns the acceptor and the certificate in DER form, which is what the
/// client fingerprints.
pub fn generate_cert_bundle() -> (SslAcceptor, Vec<u8>) {
    let subject_alt_names = vec!["127.0.0.1".to_string(), "localhost".to_string()];

    let cert =
        rcgen::generate_simple_self_signed(subject_alt_names).expect("Failed to generate cert");
    let cert_pem = cert.cert.pem();
    let key_pem = cert.signing_key.serialize_pem();

    let pkey = PKey::private_key_from_pem(key_pem.as_bytes()).expect("Failed to parse private key");
    let x509 = X509::from_pem(cert_pem.as_bytes()).expect("Failed to parse certificate");
    let der = x509.to_der().expect("Failed to encode certificate");

    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())
        .expect("Failed to create SslAcceptor builder");
    builder
        .set_private_key(&pkey)
        .expect("Failed to set private key");
    builder
        .set_certificate(&x509)
        .expect("Failed to set certificate");

    (builder.build(), der)
}

/// What older firmware presents: a self-signed RSA-1024 certificate named
/// after the device MAC, TLS 1.2 only, `AES128-SHA` only.
pub fn generate_legacy_bundle() -> (SslAcceptor, Vec<u8>) {
    let rsa = Rsa::generate(1024).expect("Failed to generate RSA key");
    let pkey = PKey::from_rsa(rsa).expect("Failed to wrap RSA key");

    let mut name = X509NameBuilder::new().expect("Failed to create name builder");
    name.append_entry_by_text("CN", "00:11:22:33:44:55")
        .expect("Failed to set CN");
    let name = name.build();

    let serial = BigNum::from_u32(1)
        .and_then(|bn| bn.to_asn1_integer())
        .expect("Failed to build serial");
    let not_before = Asn1Time::days_from_now(0).expect("Failed to build notBefore");
    let not_after = Asn1Time::days_from_now(365).expect("Failed to build notAfter");

    let mut x509 = X509::builder().expect("Failed to create X509 builder");
    x509.set_version(2).expect("Failed to set version");
    x509.set_serial_number(&serial).expect("Failed to set serial");
    x509.set_subject_name(&name).expect("Failed to set subject");
    x509.set_issuer_name(&name).expect("Failed to set issuer");
    x509.set_pubkey(&pkey).expect("Failed to set public key");
    x509.set_not_before(&not_before).expect("Failed to set notBefore");
    x509.set_not_after(&not_after).expect("Failed to set notAfter");
    x509.sign(&pkey, MessageDigest::sha256())
        .expect("Failed to sign certificate");
    let x509 = x509.build();
    let der = x509.to_der().expect("Failed to encode certificate");

    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())
        .expect("Failed to create SslAcceptor builder");
    builder
        .set_min_proto_version(Some(SslVersion::TLS1_2))
        .expect("Failed to set min version");
    builder
        .set_max_proto_version(Some(SslVersion::TLS1_2))
        .expect("Failed to set max version");
    builder
        .set_cipher_list("AES128-SHA")
        .expect("Failed to set cipher list");
    builder
        .set_private_key(&pkey)
        .expect("Failed to set private key");
    builder
        .set_certificate(&x509)
        .expect("Failed to set certificate");

    (builder.build(), der)
}
