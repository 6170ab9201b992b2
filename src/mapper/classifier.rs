//! Partition metric fields into syslog header values and structured data.
//!
//! Header keys are recognised case-insensitively and removed first. Every
//! other key is filed under the first configured SDID whose
//! `"<sdid><separator>"` prefix it carries, explicit SDIDs before the default
//! one. Keys without a recognised prefix land in the default SDID when one is
//! configured and are dropped otherwise.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::message::StructuredElement;
use crate::metric::FieldValue;

/// Longest SD-NAME allowed by RFC 5424.
pub const MAX_SD_NAME_LEN: usize = 32;

/// Header slots a field may be consumed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    Pri,
    Msg,
    Hostname,
    AppName,
    ProcId,
    MsgId,
}

impl HeaderField {
    const ALL: [HeaderField; 6] = [
        HeaderField::Pri,
        HeaderField::Msg,
        HeaderField::Hostname,
        HeaderField::AppName,
        HeaderField::ProcId,
        HeaderField::MsgId,
    ];

    /// Accepted field keys, in precedence order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            HeaderField::Pri => &["PRI"],
            HeaderField::Msg => &["MSG", "MESSAGE"],
            HeaderField::Hostname => &["HOSTNAME", "SOURCE"],
            HeaderField::AppName => &["APP-NAME", "APPNAME"],
            HeaderField::ProcId => &["PROCID"],
            HeaderField::MsgId => &["MSGID"],
        }
    }

    /// Match a field key against the header aliases, returning the header
    /// and the alias rank.
    pub fn recognise(key: &str) -> Option<(HeaderField, usize)> {
        Self::ALL.into_iter().find_map(|header| {
            header
                .aliases()
                .iter()
                .position(|alias| alias.eq_ignore_ascii_case(key))
                .map(|rank| (header, rank))
        })
    }
}

/// Header values pulled out of a metric's fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderFields<'a> {
    pub pri: Option<&'a FieldValue>,
    pub msg: Option<&'a FieldValue>,
    pub hostname: Option<&'a FieldValue>,
    pub app_name: Option<&'a FieldValue>,
    pub proc_id: Option<&'a FieldValue>,
    pub msg_id: Option<&'a FieldValue>,
}

impl<'a> HeaderFields<'a> {
    fn slot(&mut self, header: HeaderField) -> &mut Option<&'a FieldValue> {
        match header {
            HeaderField::Pri => &mut self.pri,
            HeaderField::Msg => &mut self.msg,
            HeaderField::Hostname => &mut self.hostname,
            HeaderField::AppName => &mut self.app_name,
            HeaderField::ProcId => &mut self.proc_id,
            HeaderField::MsgId => &mut self.msg_id,
        }
    }
}

/// SDIDs recognised when grouping fields into structured data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdidConfig {
    pub default_sdid: String,
    pub sdids: Vec<String>,
    pub separator: String,
}

impl Default for SdidConfig {
    fn default() -> Self {
        Self {
            default_sdid: String::new(),
            sdids: Vec::new(),
            separator: "_".into(),
        }
    }
}

impl SdidConfig {
    /// Candidate SDIDs in match order: explicit SDIDs, then the default.
    fn candidates(&self) -> impl Iterator<Item = &str> {
        self.sdids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.default_sdid.as_str()))
            .filter(|sdid| !sdid.is_empty())
    }

    /// Resolve the SDID and parameter name a non-header key is filed under.
    pub fn route<'k>(&'k self, key: &'k str) -> Option<(&'k str, &'k str)> {
        self.candidates()
            .find_map(|sdid| {
                key.strip_prefix(sdid)
                    .and_then(|rest| rest.strip_prefix(self.separator.as_str()))
                    .filter(|param| !param.is_empty())
                    .map(|param| (sdid, param))
            })
            .or_else(|| {
                (!self.default_sdid.is_empty()).then_some((self.default_sdid.as_str(), key))
            })
    }
}

/// Result of classifying a metric's fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classified<'a> {
    pub headers: HeaderFields<'a>,
    pub structured_data: Vec<StructuredElement>,
}

/// True when `name` is a valid RFC 5424 SD-NAME.
pub fn is_valid_sd_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SD_NAME_LEN
        && name
            .bytes()
            .all(|b| (33..=126).contains(&b) && !matches!(b, b'=' | b']' | b'"'))
}

/// Classify `fields` into header values and sorted structured-data elements.
pub fn classify<'a>(fields: &'a BTreeMap<String, FieldValue>, config: &SdidConfig) -> Classified<'a> {
    let mut headers = HeaderFields::default();
    let mut ranks: [Option<usize>; 6] = [None; 6];
    let mut groups: BTreeMap<&str, BTreeMap<&str, String>> = BTreeMap::new();

    for (key, value) in fields {
        if let Some((header, rank)) = HeaderField::recognise(key) {
            let best = &mut ranks[header as usize];
            if best.is_none_or(|current| rank < current) {
                *best = Some(rank);
                *headers.slot(header) = Some(value);
            }
            continue;
        }

        let Some((sdid, param)) = config.route(key) else {
            continue;
        };
        if !is_valid_sd_name(param) {
            warn!("skipping field {key:?}: {param:?} is not a valid SD-PARAM name");
            continue;
        }
        if groups
            .entry(sdid)
            .or_default()
            .insert(param, value.to_string())
            .is_some()
        {
            debug!("field {key:?} overrides an earlier value for {sdid} {param}");
        }
    }

    let structured_data = groups
        .into_iter()
        .filter(|(_, params)| !params.is_empty())
        .map(|(sdid, params)| StructuredElement {
            id: sdid.to_owned(),
            params: params
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
        })
        .collect();

    Classified {
        headers,
        structured_data,
    }
}
