//! `gridtel probe <device>`: one time-bounded Capabilities call.

use tabled::Tabled;
use tracing::info;

use gridtel_api::proto::{CapabilityResponse, Encoding, ModelData};
use gridtel_core::{Device, GnmiDialer};

use crate::cli::{GlobalOpts, ProbeArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Organization")]
    organization: String,
    #[tabled(rename = "Version")]
    version: String,
}

impl From<&ModelData> for ModelRow {
    fn from(m: &ModelData) -> Self {
        Self {
            name: m.name.clone(),
            organization: m.organization.clone(),
            version: m.version.clone(),
        }
    }
}

pub async fn handle(args: ProbeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load(global)?;
    let roster = config.roster()?;
    let device = roster
        .device(&args.device)
        .ok_or_else(|| CliError::UnknownDevice {
            id: args.device.clone(),
        })?;

    let dialer = GnmiDialer::new(config.collector_config());
    let caps = dialer.probe(device).await?;
    info!(device = %device.id, models = caps.supported_models.len(), "probe succeeded");

    output::print_output(&render(device, &caps));
    Ok(())
}

fn encoding_names(raw: &[i32]) -> String {
    let names: Vec<String> = raw
        .iter()
        .map(|&e| Encoding::try_from(e).map_or_else(|_| format!("unknown({e})"), |e| format!("{e:?}")))
        .collect();
    if names.is_empty() {
        "-".into()
    } else {
        names.join(", ")
    }
}

fn render(device: &Device, caps: &CapabilityResponse) -> String {
    let detail = output::render_detail(&[
        ("Device", format!("{} ({})", device.id, device.name)),
        ("Target", format!("{}:{}", device.host, device.port)),
        ("gNMI", caps.g_nmi_version.clone()),
        ("Encodings", encoding_names(&caps.supported_encodings)),
        ("Models", caps.supported_models.len().to_string()),
    ]);
    if caps.supported_models.is_empty() {
        return detail;
    }
    let rows: Vec<ModelRow> = caps.supported_models.iter().map(ModelRow::from).collect();
    format!("{detail}\n\n{}", output::render_table(&rows))
}
