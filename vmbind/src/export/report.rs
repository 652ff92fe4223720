//! Attach report: which capabilities bound, to what, and why others did not

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::domain::{BindError, Requirement};
use crate::registry::{CapabilityOutcome, Resolution, VmFunctions};

/// Status of one capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Bound,
    Unavailable,
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub capability: String,
    pub requirement: String,
    pub signature: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Hex string, e.g. `0x7f3a10453210`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// 0 for the newest candidate; higher means a legacy fallback matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&CapabilityOutcome> for CapabilityReport {
    fn from(outcome: &CapabilityOutcome) -> Self {
        let (status, symbol, address, rank, error) = match &outcome.result {
            Ok(bound) => (
                Status::Bound,
                Some(bound.symbol().to_string()),
                Some(bound.address().to_string()),
                Some(bound.rank()),
                None,
            ),
            Err(e) => (Status::Unavailable, None, None, None, Some(e.to_string())),
        };
        Self {
            capability: outcome.capability.to_string(),
            requirement: outcome.requirement.to_string(),
            signature: outcome.signature.to_string(),
            status,
            symbol,
            address,
            rank,
            error,
        }
    }
}

/// Report of one resolution pass against one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachReport {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector: Option<String>,
    /// False if any mandatory capability is unavailable
    pub ready: bool,
    pub capabilities: Vec<CapabilityReport>,
    /// Failure that stopped the pass before capabilities were resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl AttachReport {
    /// Report of a full pass, whether or not it would make a ready registry
    #[must_use]
    pub fn from_resolution(image: impl Into<String>, resolution: &Resolution) -> Self {
        Self::build(
            image.into(),
            resolution.pointer_width.bits(),
            resolution.collector.to_string(),
            resolution.outcomes.iter(),
        )
    }

    /// Report of a ready registry
    #[must_use]
    pub fn from_registry(image: impl Into<String>, registry: &VmFunctions) -> Self {
        Self::build(
            image.into(),
            registry.pointer_width().bits(),
            registry.collector().to_string(),
            registry.outcomes().iter(),
        )
    }

    /// Report of a pass that could not start or finish
    #[must_use]
    pub fn from_error(image: impl Into<String>, error: &BindError) -> Self {
        Self {
            image: image.into(),
            pointer_width: None,
            collector: None,
            ready: false,
            capabilities: Vec::new(),
            fatal: Some(error.to_string()),
        }
    }

    fn build<'a>(
        image: String,
        bits: u32,
        collector: String,
        outcomes: impl Iterator<Item = &'a CapabilityOutcome>,
    ) -> Self {
        let mut ready = true;
        let capabilities = outcomes
            .inspect(|o| {
                if o.result.is_err() && o.requirement == Requirement::Mandatory {
                    ready = false;
                }
            })
            .map(CapabilityReport::from)
            .collect();
        Self {
            image,
            pointer_width: Some(bits),
            collector: Some(collector),
            ready,
            capabilities,
            fatal: None,
        }
    }

    /// Capabilities that did not bind
    pub fn unavailable(&self) -> impl Iterator<Item = &CapabilityReport> {
        self.capabilities.iter().filter(|c| c.status == Status::Unavailable)
    }

    /// Write the report as pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)
            .context("Failed to serialize attach report")?;
        writeln!(writer).context("Failed to write attach report")?;
        Ok(())
    }
}

impl fmt::Display for AttachReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Runtime image: {}", self.image)?;
        if let Some(fatal) = &self.fatal {
            return writeln!(f, "  ❌ {fatal}");
        }
        if let (Some(bits), Some(collector)) = (self.pointer_width, &self.collector) {
            writeln!(f, "  {bits}-bit, collector: {collector}")?;
        }
        for cap in &self.capabilities {
            match cap.status {
                Status::Bound => writeln!(
                    f,
                    "  ✓ {:<28} {} {}{}",
                    cap.capability,
                    cap.address.as_deref().unwrap_or("?"),
                    cap.symbol.as_deref().unwrap_or("?"),
                    match cap.rank {
                        Some(rank) if rank > 0 => format!(" (fallback #{rank})"),
                        _ => String::new(),
                    }
                )?,
                Status::Unavailable => writeln!(
                    f,
                    "  {} {:<28} [{}] {}",
                    if cap.requirement == "mandatory" { "✗" } else { "⚠" },
                    cap.capability,
                    cap.requirement,
                    cap.error.as_deref().unwrap_or("")
                )?,
            }
        }
        write!(f, "  {}", if self.ready { "ready" } else { "NOT ready" })
    }
}
