//! Wire schema of the MES service
//!
//! Responses are deserialized into these fixed shapes. Anything that does not
//! fit is an `InvalidResponse` for the call that produced it.

use fleet_types::Serial;
use serde::{Deserialize, Serialize};

pub(crate) const SUCCESS_CODE: i64 = 200;

pub(crate) const LOGIN_PATH: &str = "/api/Account/Login";
pub(crate) const SYSTEMS_PATH: &str = "/api/ESS/GetSystems";
pub(crate) const COMMAND_PATH: &str = "/api/ESSMainTain/ActualESSCmdModel";

/// Common response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,

    #[serde(default)]
    pub msg: Option<String>,

    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    #[serde(rename = "AccessToken")]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SystemsRequest<'a> {
    pub sort_by: &'a str,
    pub search_by: &'a str,
    pub state: &'a str,
    pub keyword: &'a str,
    pub page_index: u32,
    pub page_size: u32,
    pub data_count: u32,
}

/// One listed system. A blank or missing `sys_sn` fails the whole page, so
/// that state contributes no serials and is reported in `failed_states`.
#[derive(Debug, Deserialize)]
pub(crate) struct SystemItem {
    pub sys_sn: Serial,
}

/// `data` of a systems listing: paged object or bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SystemsPayload {
    Paged {
        data: Vec<SystemItem>,
        #[serde(default, alias = "totalCount", alias = "count")]
        total: Option<u64>,
    },
    Bare(Vec<SystemItem>),
}

impl SystemsPayload {
    pub fn into_parts(self) -> (Vec<Serial>, Option<u64>) {
        match self {
            SystemsPayload::Paged { data, total } => {
                (data.into_iter().map(|i| i.sys_sn).collect(), total)
            }
            SystemsPayload::Bare(items) => (items.into_iter().map(|i| i.sys_sn).collect(), None),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandRequest<'a> {
    pub sys_sn: &'a str,
    pub cmd_code: &'a str,
    pub language_code: &'a str,
    pub start_time: &'a str,
    pub remark: &'a str,
}
