//! The telemetry resources the modem exposes under `data/`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, Result};

/// One JSON resource of the management interface.
///
/// This enumeration is the only source of valid dataset identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// `{"UserType": "1"}`
    UserType,
    /// `{"modelName": "CGNV4-FX4", "skipWizard": "1"}`
    SystemModel,
    /// Serial number, versions, LAN/WAN byte counters, uptime, clock.
    SysInfo,
    /// DOCSIS initialisation steps and BPI status.
    CmInit,
    /// Downstream channels.
    DsInfo,
    /// Cable-side IP configuration.
    CmDocsisWan,
    /// Upstream channels.
    UsInfo,
    /// LAN clients.
    ConnectInfo,
    /// Tuned downstream frequency.
    TuneFreq,
}

impl Dataset {
    pub const ALL: [Dataset; 9] = [
        Dataset::UserType,
        Dataset::SystemModel,
        Dataset::SysInfo,
        Dataset::CmInit,
        Dataset::DsInfo,
        Dataset::CmDocsisWan,
        Dataset::UsInfo,
        Dataset::ConnectInfo,
        Dataset::TuneFreq,
    ];

    /// Resource name as used by the device.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::UserType => "user_type",
            Dataset::SystemModel => "system_model",
            Dataset::SysInfo => "getSysInfo",
            Dataset::CmInit => "getCMInit",
            Dataset::DsInfo => "dsinfo",
            Dataset::CmDocsisWan => "getCmDocsisWan",
            Dataset::UsInfo => "usinfo",
            Dataset::ConnectInfo => "getConnectInfo",
            Dataset::TuneFreq => "getTuneFreq",
        }
    }

    /// Path relative to the base URL.
    pub fn path(self) -> String {
        format!("data/{}.asp", self.name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| Error::response_format(format!("unknown dataset {:?}", s)))
    }
}

/// One accessor per dataset.
impl Client {
    pub async fn user_type(&mut self) -> Result<Value> {
        self.get_data(Dataset::UserType).await
    }

    pub async fn system_model(&mut self) -> Result<Value> {
        self.get_data(Dataset::SystemModel).await
    }

    pub async fn sys_info(&mut self) -> Result<Value> {
        self.get_data(Dataset::SysInfo).await
    }

    pub async fn cm_init(&mut self) -> Result<Value> {
        self.get_data(Dataset::CmInit).await
    }

    pub async fn ds_info(&mut self) -> Result<Value> {
        self.get_data(Dataset::DsInfo).await
    }

    pub async fn cm_docsis_wan(&mut self) -> Result<Value> {
        self.get_data(Dataset::CmDocsisWan).await
    }

    pub async fn us_info(&mut self) -> Result<Value> {
        self.get_data(Dataset::UsInfo).await
    }

    pub async fn connect_info(&mut self) -> Result<Value> {
        self.get_data(Dataset::ConnectInfo).await
    }

    pub async fn tune_freq(&mut self) -> Result<Value> {
        self.get_data(Dataset::TuneFreq).await
    }
}
