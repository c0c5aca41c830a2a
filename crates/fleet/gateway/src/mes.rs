//! HTTP gateway for the MES device management service

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::schema::{
    CommandRequest, Envelope, LoginData, LoginRequest, SystemsPayload, SystemsRequest,
    COMMAND_PATH, LOGIN_PATH, SUCCESS_CODE, SYSTEMS_PATH,
};
use crate::session::{Credentials, Session};
use crate::traits::{CommandOutcome, DeviceGateway, OnlineListing, RejectReason};
use async_trait::async_trait;
use fleet_types::Serial;
use futures::future::join_all;
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One page of a state query
#[derive(Debug)]
struct StatePage {
    serials: Vec<Serial>,
    total: Option<u64>,
}

/// reqwest-backed gateway
#[derive(Debug, Clone)]
pub struct MesGateway {
    client: Client,
    base_url: String,
    config: GatewayConfig,
}

impl MesGateway {
    /// Create a gateway using the configured timeout
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self::with_timeout(config, timeout)
    }

    /// Create a gateway with an explicit per-request timeout
    pub fn with_timeout(config: GatewayConfig, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn post<B, R>(&self, path: &str, session: Option<&Session>, body: &B) -> GatewayResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(header::CONTENT_TYPE, "application/json;charset=UTF-8")
            .json(body);
        if let Some(session) = session {
            request = request.header(header::AUTHORIZATION, session.bearer());
        }

        let response = request.send().await.map_err(GatewayError::from_reqwest)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            if let Some(session) = session {
                session.invalidate();
            }
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(GatewayError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn query_state(&self, session: &Session, state: &str) -> GatewayResult<StatePage> {
        let body = SystemsRequest {
            sort_by: "registrationtime",
            search_by: "sn",
            state,
            keyword: "",
            page_index: 1,
            page_size: self.config.page_size,
            data_count: 1,
        };

        let envelope: Envelope<SystemsPayload> =
            self.post(SYSTEMS_PATH, Some(session), &body).await?;
        if envelope.code != SUCCESS_CODE {
            return Err(GatewayError::RemoteCode(envelope.code));
        }

        match envelope.data {
            Some(payload) => {
                let (serials, total) = payload.into_parts();
                Ok(StatePage { serials, total })
            }
            None => {
                tracing::debug!(state = %state, "No data returned for state");
                Ok(StatePage {
                    serials: Vec::new(),
                    total: None,
                })
            }
        }
    }
}

#[async_trait]
impl DeviceGateway for MesGateway {
    async fn login(&self, credentials: &Credentials) -> GatewayResult<Session> {
        let body = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        let envelope: Envelope<LoginData> = self.post(LOGIN_PATH, None, &body).await?;
        if envelope.code != SUCCESS_CODE {
            return Err(GatewayError::LoginRejected {
                code: envelope.code,
                message: envelope.msg.unwrap_or_default(),
            });
        }

        let token = envelope
            .data
            .map(|d| d.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("missing AccessToken".to_string()))?;

        tracing::debug!(username = %credentials.username, "Logged in to MES");
        Ok(Session::new(token))
    }

    async fn list_online_devices(&self, session: &Session) -> OnlineListing {
        let queries = self
            .config
            .states
            .iter()
            .map(|state| async move { (state, self.query_state(session, state).await) });
        let results = join_all(queries).await;

        let mut listing = OnlineListing::default();
        for (state, result) in results {
            match result {
                Ok(page) => {
                    let returned = page.serials.len();
                    if let Some(total) = page.total {
                        if total > returned as u64 {
                            tracing::warn!(
                                state = %state,
                                total,
                                returned,
                                page_size = self.config.page_size,
                                "State listing truncated to one page"
                            );
                            listing.truncated_states.push(state.clone());
                        }
                    }
                    tracing::info!(state = %state, count = returned, "Retrieved systems for state");
                    listing.serials.extend(page.serials);
                }
                Err(e) => {
                    tracing::warn!(state = %state, error = %e, "State query failed, contributing no devices");
                    listing.failed_states.push(state.clone());
                }
            }
        }

        listing
    }

    async fn send_command(&self, session: &Session, serial: &Serial) -> CommandOutcome {
        let params = &self.config.command;
        let body = CommandRequest {
            sys_sn: serial.as_str(),
            cmd_code: &params.cmd_code,
            language_code: &params.language_code,
            start_time: &params.start_time,
            remark: &params.remark,
        };

        let result: GatewayResult<Envelope<Value>> =
            self.post(COMMAND_PATH, Some(session), &body).await;

        match result {
            Ok(envelope) if envelope.code == SUCCESS_CODE => CommandOutcome::Accepted,
            Ok(envelope) => {
                tracing::warn!(
                    serial = %serial,
                    code = envelope.code,
                    msg = envelope.msg.as_deref().unwrap_or(""),
                    "Command declined by remote service"
                );
                CommandOutcome::Rejected {
                    reason: RejectReason::RemoteCode(envelope.code),
                }
            }
            Err(e) => {
                tracing::warn!(serial = %serial, error = %e, "Command request failed");
                CommandOutcome::Rejected { reason: e.into() }
            }
        }
    }
}
