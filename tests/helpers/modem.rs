//! Canned behaviour of a CGNV4 management interface.

use super::mock_server::{MockResponse, RecordedRequest};

pub const USR: &str = "uuu";
pub const PWD: &str = "ppp";

pub const SYSINFO: &str = r#"[{"LRecPkt":"12.12M Bytes","LSendPkt":"40.14M Bytes",
    "WRecPkt":"40.25M Bytes","WSendPkt":"11.77M Bytes","hwVersion":"2D",
    "serialNumber":"ABC123","swVersion":"4.5.10.201-CD-UPC",
    "systemTime":"Fri Jun 17, 2022, 17:09:10",
    "systemUptime":"00 Days,05 Hours,38 Minutes,47 Seconds"}]"#;
pub const SYSTEM_MODEL: &str = r#"{"modelName":"CGNV4-FX4","skipWizard":"1"}"#;
pub const CMINIT: &str = r#"[{"bpiStatus":"AUTH:authorized, TEK:operational"}]"#;
pub const USINFO: &str = r#"[{"portId":"1","frequency":"39400000","bandwidth":"6400000",
    "channelId":"2","signalStrength":"36.000"}]"#;
pub const DSINFO: &str = r#"[{"portId":"1","frequency":"426250000","channelId":"9",
    "signalStrength":"17.400","snr":"40.946"}]"#;
pub const TUNEFREQ: &str = r#"[{"tunefreq":"213.45"}]"#;

pub fn cookie<'a>(req: &'a RecordedRequest, name: &str) -> Option<&'a str> {
    req.header("Cookie")?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn logged_in(req: &RecordedRequest) -> bool {
    cookie(req, "session") == Some("sessionid")
}

/// A modem that accepts `USR`/`PWD`.
pub fn handle(req: &RecordedRequest) -> MockResponse {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => MockResponse::redirect("/login.asp")
            .header("Set-Cookie", "preSession=presession_id; path=/"),
        ("POST", "/goform/login") => {
            let form = req.form();
            let field = |name: &str| {
                form.iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.as_str())
            };
            if field("preSession") != Some("presession_id") {
                return MockResponse::ok("session timeout expired");
            }
            if field("usr") != Some(USR) || field("pwd") != Some(PWD) {
                return MockResponse::ok("Wrong Credentials.");
            }
            MockResponse::ok("success")
                .header("Set-Cookie", "session=sessionid; path=/; HttpOnly")
        }
        ("POST", "/goform/logout") => {
            if !logged_in(req) || req.body_str() != "data=byebye" {
                return MockResponse::new(500);
            }
            MockResponse::redirect("/login.asp").header(
                "Set-Cookie",
                "session=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/",
            )
        }
        ("GET", path) if path.starts_with("/data/") => {
            if !logged_in(req) {
                return MockResponse::redirect("/login.asp");
            }
            match path {
                "/data/getSysInfo.asp" => MockResponse::json(SYSINFO),
                "/data/system_model.asp" => MockResponse::json(SYSTEM_MODEL),
                "/data/getCMInit.asp" => MockResponse::json(CMINIT),
                "/data/usinfo.asp" => MockResponse::json(USINFO),
                "/data/dsinfo.asp" => MockResponse::json(DSINFO),
                "/data/getTuneFreq.asp" => MockResponse::json(TUNEFREQ),
                _ => MockResponse::new(404),
            }
        }
        _ => MockResponse::new(404),
    }
}
