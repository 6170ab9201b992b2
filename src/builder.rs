//! Builder for [`SyslogOutput`](crate::output::SyslogOutput).
//!
//! Exposes address selection, framing, structured-data grouping, timeout
//! tuning and TLS configuration. Every setting is validated in
//! [`build`](SyslogOutputBuilder::build) so a constructed output never holds
//! an unusable configuration.

use std::time::Duration;

use crate::{
    error::ConfigError,
    framing::{Framing, Trailer},
    mapper::{HostIdentity, SdidConfig, SyslogMapper, SystemHost, classifier::is_valid_sd_name},
    output::{
        Address, Dialer, NetDialer, SyslogConfig, SyslogOutput, TlsConfig, TlsOptions,
        address::Endpoint,
    },
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Builder for constructing [`SyslogOutput`] instances.
#[derive(Clone, Debug, Default)]
pub struct SyslogOutputBuilder {
    config: SyslogConfig,
}

impl From<SyslogConfig> for SyslogOutputBuilder {
    fn from(config: SyslogConfig) -> Self {
        Self { config }
    }
}

impl SyslogOutputBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.config.framing = framing;
        self
    }

    pub fn with_trailer(mut self, trailer: Trailer) -> Self {
        self.config.trailer = trailer;
        self
    }

    pub fn with_default_sdid(mut self, sdid: impl Into<String>) -> Self {
        self.config.default_sdid = sdid.into();
        self
    }

    /// Set the additional SDIDs recognised as field key prefixes.
    ///
    /// Order matters: when a key carries several configured prefixes the
    /// first listed SDID wins.
    pub fn with_sdids<I, S>(mut self, sdids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sdids = sdids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sdparam_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.sdparam_separator = separator.into();
        self
    }

    pub fn with_default_appname(mut self, appname: impl Into<String>) -> Self {
        self.config.default_appname = appname.into();
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.connect_timeout_ms = timeout;
        self
    }

    pub fn with_write_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.write_timeout_ms = Some(timeout);
        self
    }

    /// Configure TLS using the provided domain and validation policy.
    pub fn with_tls(mut self, domain: Option<String>, insecure_skip_verify: bool) -> Self {
        self.config.tls = Some(TlsConfig {
            domain,
            insecure_skip_verify,
        });
        self
    }

    pub fn config(&self) -> &SyslogConfig {
        &self.config
    }

    fn validate_sdids(&self) -> Result<(), ConfigError> {
        let default = Some(self.config.default_sdid.as_str()).filter(|s| !s.is_empty());
        for sdid in default.into_iter().chain(self.config.sdids.iter().map(String::as_str)) {
            if !is_valid_sd_name(sdid) {
                return Err(ConfigError::InvalidConfig(format!(
                    "{sdid:?} is not a valid SD-ID"
                )));
            }
        }
        if self.config.sdparam_separator.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "sdparam_separator must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), ConfigError> {
        ensure_positive!(self.config.connect_timeout_ms, "connect_timeout_ms")?;
        if let Some(timeout) = self.config.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    fn build_sdid_config(&self) -> SdidConfig {
        let mut sdids: Vec<String> = Vec::with_capacity(self.config.sdids.len());
        for sdid in &self.config.sdids {
            if !sdids.contains(sdid) {
                sdids.push(sdid.clone());
            }
        }
        SdidConfig {
            default_sdid: self.config.default_sdid.clone(),
            sdids,
            separator: self.config.sdparam_separator.clone(),
        }
    }

    fn build_tls_options(&self, address: &Address) -> Result<Option<TlsOptions>, ConfigError> {
        let Some(tls) = &self.config.tls else {
            return Ok(None);
        };
        let Endpoint::Host { host, .. } = &address.endpoint else {
            return Err(ConfigError::InvalidConfig(
                "tls is only supported for tcp transports".into(),
            ));
        };
        if !address.network.is_stream() {
            return Err(ConfigError::InvalidConfig(
                "tls is only supported for tcp transports".into(),
            ));
        }
        let domain = tls
            .domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| host.clone());
        Ok(Some(TlsOptions {
            domain,
            insecure_skip_verify: tls.insecure_skip_verify,
        }))
    }

    /// Validate the configuration and build the network dialer.
    pub fn build_dialer(&self) -> Result<NetDialer, ConfigError> {
        self.validate_timeouts()?;
        let address: Address = self.config.address.parse()?;
        let tls = self.build_tls_options(&address)?;
        Ok(NetDialer {
            address,
            tls,
            connect_timeout: Duration::from_millis(self.config.connect_timeout_ms),
            write_timeout: self.config.write_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Validate the configuration and build the mapper.
    pub fn build_mapper<H>(&self, host: H) -> Result<SyslogMapper, ConfigError>
    where
        H: HostIdentity + 'static,
    {
        self.validate_sdids()?;
        Ok(SyslogMapper::with_host(self.build_sdid_config(), host)
            .with_default_appname(self.config.default_appname.clone()))
    }

    /// Build an output using the system hostname and the network dialer.
    pub fn build(&self) -> Result<SyslogOutput, ConfigError> {
        let dialer = self.build_dialer()?;
        self.build_with(SystemHost, dialer)
    }

    /// Build an output with an explicit host identity and dialer.
    pub fn build_with<H, D>(&self, host: H, dialer: D) -> Result<SyslogOutput<D>, ConfigError>
    where
        H: HostIdentity + 'static,
        D: Dialer,
    {
        let mapper = self.build_mapper(host)?;
        Ok(SyslogOutput::new(
            mapper,
            self.config.framing,
            self.config.trailer,
            dialer,
        ))
    }
}
