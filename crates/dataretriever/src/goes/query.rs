//! Normalisation of raw query attributes into an XRS query.

use helio_common::{Attr, TimeRange};

use super::era::{known_satellites, Provider, Resolution};
use super::{CLIENT_NAME, INSTRUMENTS, PHYSOBS, SOURCE};
use crate::error::{ClientError, ClientResult};

/// Instrument assumed when the query names none.
pub const DEFAULT_INSTRUMENT: &str = "XRS";

/// A validated XRS query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrsQuery {
    pub time_range: TimeRange,
    /// Instrument name as the caller spelled it, upper-cased.
    pub instrument: String,
    pub satellite: Option<u8>,
    pub resolution: Option<Resolution>,
    /// Raw resolution token, kept for error messages.
    pub resolution_token: Option<String>,
    pub provider: Option<Provider>,
}

impl XrsQuery {
    /// Build a query from attributes.
    ///
    /// Attributes outside what the client serves yield
    /// [`ClientError::CannotHandle`]. A missing instrument means XRS. An unknown resolution token is accepted
    /// here and rejected at resolve time, where the active eras are known.
    pub fn from_attrs(attrs: &[Attr]) -> ClientResult<Self> {
        let mut time_range = None;
        let mut instrument = None;
        let mut satellite = None;
        let mut resolution_token = None;
        let mut provider = None;

        for attr in attrs {
            match attr {
                Attr::Time(tr) => time_range = Some(*tr),
                Attr::Instrument(name) => {
                    if !INSTRUMENTS.iter().any(|(i, _)| i.eq_ignore_ascii_case(name)) {
                        return Err(ClientError::cannot_handle(
                            CLIENT_NAME,
                            format!("instrument '{}' is not served", name),
                        ));
                    }
                    instrument = Some(name.to_uppercase());
                }
                Attr::SatelliteNumber(n) => {
                    if !known_satellites().contains(n) {
                        return Err(ClientError::cannot_handle(
                            CLIENT_NAME,
                            format!("no archive holds GOES-{}", n),
                        ));
                    }
                    satellite = Some(*n);
                }
                Attr::Resolution(token) => resolution_token = Some(token.clone()),
                Attr::Provider(name) => {
                    provider = Some(Provider::parse(name).ok_or_else(|| {
                        ClientError::cannot_handle(CLIENT_NAME, format!("unknown provider '{}'", name))
                    })?);
                }
                Attr::Source(name) => {
                    if !name.eq_ignore_ascii_case(SOURCE.0) {
                        return Err(ClientError::cannot_handle(
                            CLIENT_NAME,
                            format!("source '{}' is not served", name),
                        ));
                    }
                }
                Attr::Physobs(name) => {
                    if !name.eq_ignore_ascii_case(PHYSOBS.0) {
                        return Err(ClientError::cannot_handle(
                            CLIENT_NAME,
                            format!("physical observable '{}' is not served", name),
                        ));
                    }
                }
            }
        }

        let time_range = time_range
            .ok_or_else(|| ClientError::cannot_handle(CLIENT_NAME, "query has no time range"))?;
        let instrument = instrument.unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string());

        Ok(Self {
            time_range,
            instrument,
            satellite,
            resolution: resolution_token.as_deref().and_then(Resolution::parse),
            resolution_token,
            provider,
        })
    }
}
