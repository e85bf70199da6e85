//! Command implementations.
//!
//! Each command opens a session over the on-disk report file, runs one
//! action and returns what to print.

use crate::config;
use crate::output::CommandOutput;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use flare_core::access::Passcode;
use flare_core::form::{PhoneFormat, ReportFormController, ReportInput};
use flare_core::geocoding::{self, Geocoder, NominatimGeocoder};
use flare_core::sort::{sort_reports, SortKey, SortOrder};
use flare_core::storage::NativeStorage;
use flare_core::{BoundingBox, Geocode, ReportId, ReportSession, ReportStore};
use std::path::PathBuf;
use tracing::info;

pub type CliSession = ReportSession<NativeStorage, NominatimGeocoder>;

/// Report fields shared by `add` and `modify`. Omitted fields are left as
/// they are.
#[derive(Args, Debug, Default)]
pub struct ReportFields {
    /// Reporter name
    #[arg(long)]
    pub name: Option<String>,

    /// Reporter phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Emergency type: Fire, Shooting, Vehicle Accident, Medical, or free text
    #[arg(long = "type")]
    pub emergency_type: Option<String>,

    /// Street address; looked up when no coordinate is given
    #[arg(long)]
    pub address: Option<String>,

    /// Place or landmark name
    #[arg(long)]
    pub place: Option<String>,

    /// Picture URL
    #[arg(long)]
    pub picture: Option<String>,

    #[arg(long)]
    pub comments: Option<String>,

    /// Latitude in degrees
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
}

impl ReportFields {
    /// Writes the given fields into `input`.
    ///
    /// A new address without a new coordinate drops the old coordinate so
    /// the address gets looked up again.
    pub fn apply_to(self, input: &mut ReportInput, phone_format: PhoneFormat) {
        let coordinate = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Geocode { lat, lng }),
            _ => None,
        };

        if let Some(name) = self.name {
            input.reporter_name = name;
        }
        if let Some(phone) = self.phone {
            input.reporter_phone = phone_format.normalize(phone.trim());
        }
        if let Some(emergency_type) = self.emergency_type {
            input.emergency_type = emergency_type;
        }
        if let Some(address) = self.address {
            if coordinate.is_none() && address.trim() != input.address.trim() {
                input.geocode = None;
            }
            input.address = address;
        }
        if let Some(place) = self.place {
            input.place_name = place;
        }
        if let Some(picture) = self.picture {
            input.picture_url = picture;
        }
        if let Some(comments) = self.comments {
            input.comments = comments;
        }
        if coordinate.is_some() {
            input.geocode = coordinate;
        }
    }
}

/// Opens the report file under `data_dir` and wires up a session from the
/// environment.
pub async fn open_session(data_dir: Option<&PathBuf>) -> Result<CliSession> {
    let data_dir = config::get_data_dir(data_dir)?;
    info!("Opening reports in {}", data_dir.display());

    let storage = NativeStorage::with_path(data_dir.clone())
        .with_context(|| format!("Failed to open data directory: {}", data_dir.display()))?;
    let store = ReportStore::open(storage).await;

    let form = ReportFormController::new(config::phone_format_from_env()?);
    let mut session = ReportSession::new(store, open_geocoder()?).with_form(form);
    if let Some(gate) = config::access_gate_from_env()? {
        session = session.with_access_gate(gate);
    }
    Ok(session)
}

pub fn open_geocoder() -> Result<NominatimGeocoder> {
    NominatimGeocoder::new(config::nominatim_config_from_env())
        .context("Failed to configure geocoding service")
}

fn require_passcode(passcode: &Passcode) -> Result<&str> {
    if passcode.is_empty() {
        bail!(
            "This action requires the passcode (--passcode or {})",
            crate::PASSCODE_ENV
        );
    }
    Ok(passcode.as_str())
}

pub async fn add(session: &mut CliSession, fields: ReportFields) -> Result<CommandOutput> {
    let mut input = ReportInput::default();
    let phone_format = session.form().phone_format();
    fields.apply_to(&mut input, phone_format);

    let report = session
        .submit(input)
        .await
        .context("Failed to add report")?;
    Ok(CommandOutput::Report { report })
}

pub fn list(
    session: &mut CliSession,
    bounds: Option<BoundingBox>,
    key: SortKey,
    order: SortOrder,
) -> CommandOutput {
    let mut reports = match bounds {
        Some(bounds) => {
            session.set_bounds(bounds);
            session.visible_reports().to_vec()
        }
        None => session.reports().to_vec(),
    };
    sort_reports(&mut reports, key, order);
    CommandOutput::Reports {
        reports,
        focused: session.focused_id(),
    }
}

pub fn show(session: &CliSession, id: u64) -> Result<CommandOutput> {
    let id = ReportId::from_u64(id);
    let report = session
        .store()
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("Report {} not found", id))?;
    Ok(CommandOutput::Report { report })
}

pub fn select(session: &mut CliSession, id: u64) -> Result<CommandOutput> {
    let id = ReportId::from_u64(id);
    if !session.store().contains(id) {
        bail!("Report {} not found", id);
    }
    let target = session.select(id);
    Ok(CommandOutput::Focus { id, target })
}

pub async fn resolve(session: &mut CliSession, id: u64, passcode: &Passcode) -> Result<CommandOutput> {
    let passcode = require_passcode(passcode)?;
    let report = session
        .resolve(ReportId::from_u64(id), passcode)
        .await
        .with_context(|| format!("Failed to resolve report {}", id))?;
    Ok(CommandOutput::Report { report })
}

pub async fn modify(
    session: &mut CliSession,
    id: u64,
    fields: ReportFields,
    passcode: &Passcode,
) -> Result<CommandOutput> {
    let passcode = require_passcode(passcode)?;
    let report_id = ReportId::from_u64(id);
    let mut input = session
        .edit_form(report_id, passcode)
        .with_context(|| format!("Failed to modify report {}", id))?;

    let phone_format = session.form().phone_format();
    fields.apply_to(&mut input, phone_format);

    let report = session
        .modify(report_id, input, passcode)
        .await
        .with_context(|| format!("Failed to modify report {}", id))?;
    Ok(CommandOutput::Report { report })
}

pub async fn delete(session: &mut CliSession, id: u64, passcode: &Passcode) -> Result<CommandOutput> {
    let passcode = require_passcode(passcode)?;
    let id = ReportId::from_u64(id);
    session
        .delete(id, passcode)
        .await
        .with_context(|| format!("Failed to delete report {}", id))?;
    Ok(CommandOutput::Deleted { id })
}

pub async fn clear(session: &mut CliSession) -> Result<CommandOutput> {
    let count = session.reports().len();
    session
        .clear_all()
        .await
        .context("Failed to clear reports")?;
    Ok(CommandOutput::Cleared { count })
}

pub async fn search<G: Geocoder>(geocoder: &G, query: &str, limit: usize) -> Result<CommandOutput> {
    let suggestions = geocoding::suggest(geocoder, query, limit)
        .await
        .with_context(|| format!("Address search for \"{}\" failed", query))?;
    Ok(CommandOutput::Suggestions {
        query: query.to_string(),
        suggestions,
    })
}

pub async fn reverse<G: Geocoder>(geocoder: &G, lat: f64, lon: f64) -> Result<CommandOutput> {
    let point = Geocode::new(lat, lon).context("Invalid coordinate")?;
    let lookup = geocoder
        .reverse(point)
        .await
        .with_context(|| format!("Reverse lookup for {} failed", point))?;
    Ok(CommandOutput::Address {
        short_address: lookup.short_address(),
        lookup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_core::access::Passcode;
    use flare_core::geocoding::NominatimConfig;
    use flare_core::AccessGate;
    use tempfile::TempDir;

    async fn gated_session(dir: &TempDir) -> CliSession {
        let storage = NativeStorage::with_path(dir.path().to_path_buf()).unwrap();
        let store = ReportStore::open(storage).await;
        let geocoder = NominatimGeocoder::new(NominatimConfig::default()).unwrap();
        let gate = AccessGate::from_secret(Passcode::new("MuMeLeLe".to_string()));
        ReportSession::new(store, geocoder).with_access_gate(gate)
    }

    fn fields() -> ReportFields {
        ReportFields {
            name: Some("Jo Park".to_string()),
            phone: Some("(604) 123-4567".to_string()),
            emergency_type: Some("fire".to_string()),
            address: Some("511 Royal Ave".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_fields_to_new_input() {
        let mut input = ReportInput::default();
        fields().apply_to(&mut input, PhoneFormat::TenDigits);

        assert_eq!(input.reporter_name, "Jo Park");
        assert_eq!(input.reporter_phone, "6041234567");
        assert_eq!(input.emergency_type, "fire");
        assert_eq!(input.geocode, None);
    }

    #[test]
    fn test_phone_is_normalized_to_active_format() {
        let mut input = ReportInput::default();
        fields().apply_to(&mut input, PhoneFormat::NorthAmerican);
        assert_eq!(input.reporter_phone, "(604) 123 4567");
    }

    #[test]
    fn test_new_address_drops_stale_coordinate() {
        let point = Geocode {
            lat: 49.25,
            lng: -122.9,
        };
        let mut input = ReportInput {
            address: "511 Royal Ave".to_string(),
            geocode: Some(point),
            ..Default::default()
        };

        ReportFields {
            comments: Some("crew on scene".to_string()),
            ..Default::default()
        }
        .apply_to(&mut input, PhoneFormat::TenDigits);
        assert_eq!(input.geocode, Some(point));

        ReportFields {
            address: Some("700 Columbia St".to_string()),
            ..Default::default()
        }
        .apply_to(&mut input, PhoneFormat::TenDigits);
        assert_eq!(input.geocode, None);
    }

    #[test]
    fn test_explicit_coordinate_wins() {
        let mut input = ReportInput::default();
        ReportFields {
            lat: Some(49.2),
            lng: Some(-122.91),
            ..fields()
        }
        .apply_to(&mut input, PhoneFormat::TenDigits);

        assert_eq!(
            input.geocode,
            Some(Geocode {
                lat: 49.2,
                lng: -122.91
            })
        );
    }

    #[tokio::test]
    async fn test_modify_with_wrong_passcode_hides_missing_ids() {
        let dir = TempDir::new().unwrap();
        let mut session = gated_session(&dir).await;
        let added = add(
            &mut session,
            ReportFields {
                lat: Some(49.25),
                lng: Some(-122.9),
                ..fields()
            },
        )
        .await
        .unwrap();
        let CommandOutput::Report { report } = added else {
            panic!("expected a report");
        };

        let wrong = Passcode::new("wrong".to_string());
        let existing = modify(&mut session, report.id.as_u64(), fields(), &wrong)
            .await
            .unwrap_err();
        let missing = modify(&mut session, 42, fields(), &wrong)
            .await
            .unwrap_err();

        assert!(format!("{:#}", existing).ends_with("Incorrect passcode"));
        assert!(format!("{:#}", missing).ends_with("Incorrect passcode"));
        assert!(!format!("{:#}", missing).contains("not found"));
    }

    #[test]
    fn test_missing_passcode_is_reported() {
        let empty = Passcode::new(String::new());
        assert!(require_passcode(&empty).is_err());

        let given = Passcode::new("MuMeLeLe".to_string());
        assert_eq!(require_passcode(&given).unwrap(), "MuMeLeLe");
    }
}
