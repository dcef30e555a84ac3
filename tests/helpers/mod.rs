#![allow(dead_code)]

pub mod mock_server;
pub mod modem;
pub mod tls;
