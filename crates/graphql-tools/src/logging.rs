//! Logging config and subscriber setup
//!
//! The library itself only emits `tracing` events. Embedding applications that
//! have no subscriber of their own can install one from [`Logging`].

mod format_style;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer as LayerTrait, Registry,
    fmt::{MakeWriter, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use format_style::FormatStyle;

use crate::errors::LoggingError;

/// Logging related options
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Logging {
    /// The log level to use for tracing
    #[serde(default = "defaults::log_level", deserialize_with = "parsers::from_str")]
    #[schemars(schema_with = "level")]
    pub level: Level,

    /// The format of log lines
    #[serde(default)]
    pub format: FormatStyle,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            format: FormatStyle::default(),
        }
    }
}

pub type LoggingLayer = Box<dyn LayerTrait<Registry> + Send + Sync>;

pub struct LoggingLayerBuilder {
    writer: Option<BoxMakeWriter>,
    ansi_enabled: bool,
}

impl Default for LoggingLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingLayerBuilder {
    pub fn new() -> Self {
        Self {
            writer: None,
            ansi_enabled: false,
        }
    }

    /// Log somewhere other than stderr
    pub fn with_writer<W>(mut self, mw: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.writer = Some(BoxMakeWriter::new(mw));
        self
    }

    pub fn with_ansi_enabled(mut self, enabled: bool) -> Self {
        self.ansi_enabled = enabled;
        self
    }

    pub fn build(self, logging: &Logging) -> LoggingLayer {
        let writer = self
            .writer
            .unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));

        let layer = tracing_subscriber::fmt::layer();
        match logging.format {
            FormatStyle::Full => layer
                .with_writer(writer)
                .with_ansi(self.ansi_enabled)
                .with_target(false)
                .boxed(),
            FormatStyle::Compact => layer
                .compact()
                .with_writer(writer)
                .with_ansi(self.ansi_enabled)
                .with_target(false)
                .boxed(),
            FormatStyle::Json => layer
                .json()
                .with_writer(writer)
                .with_ansi(self.ansi_enabled)
                .with_target(false)
                .boxed(),
            FormatStyle::Pretty => layer
                .pretty()
                .with_writer(writer)
                .with_ansi(self.ansi_enabled)
                .with_target(false)
                .boxed(),
        }
    }
}

impl Logging {
    /// `RUST_LOG` directives, on top of the configured level
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let mut env_filter = EnvFilter::from_default_env().add_directive(self.level.into());

        if self.level == Level::INFO {
            env_filter = env_filter.add_directive("apollo_compiler=warn".parse()?);
        }
        Ok(env_filter)
    }

    /// Install a global subscriber logging to stderr
    pub fn init(&self) -> Result<(), LoggingError> {
        let env_filter = self.env_filter()?;
        let logging_layer = LoggingLayerBuilder::new()
            .with_ansi_enabled(true)
            .build(self);

        tracing_subscriber::registry()
            .with(logging_layer)
            .with(env_filter)
            .try_init()?;
        Ok(())
    }
}

mod defaults {
    use tracing::Level;

    pub(super) const fn log_level() -> Level {
        Level::INFO
    }
}

mod parsers {
    use std::{fmt::Display, marker::PhantomData, str::FromStr};

    use serde::Deserializer;

    pub(super) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        struct FromStrVisitor<Inner> {
            _phantom: PhantomData<Inner>,
        }
        impl<Inner> serde::de::Visitor<'_> for FromStrVisitor<Inner>
        where
            Inner: FromStr,
            <Inner as FromStr>::Err: Display,
        {
            type Value = Inner;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Inner::from_str(v).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(FromStrVisitor {
            _phantom: PhantomData,
        })
    }
}

fn level(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    /// Log level
    #[derive(JsonSchema)]
    #[schemars(rename_all = "lowercase")]
    #[allow(dead_code)]
    enum Level {
        Trace,
        Debug,
        Info,
        Warn,
        Error,
    }

    Level::json_schema(generator)
}
