//! `gridtel check`: validate the config and print what would be collected.

use tabled::Tabled;

use gridtel_config::Config;
use gridtel_core::{Device, Link, LinkEndpoint, Roster};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "User")]
    user: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            role: d.role.to_string(),
            target: format!("{}:{}", d.host, d.port),
            user: d
                .credentials
                .as_ref()
                .map_or_else(|| "-".into(), |c| c.username.clone()),
        }
    }
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "A")]
    a: String,
    #[tabled(rename = "B")]
    b: String,
}

fn endpoint(end: &LinkEndpoint) -> String {
    format!("{} {}", end.device, end.interface)
}

impl From<&Link> for LinkRow {
    fn from(l: &Link) -> Self {
        Self {
            id: l.id.clone(),
            a: endpoint(&l.a),
            b: endpoint(&l.b),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load(global)?;
    // Building the roster also resolves every device's password.
    let roster = config.roster()?;
    output::print_output(&render(&config, &roster)?);
    Ok(())
}

fn render(config: &Config, roster: &Roster) -> Result<String, CliError> {
    let devices: Vec<DeviceRow> = roster.devices().map(DeviceRow::from).collect();
    let links: Vec<LinkRow> = roster.links().map(LinkRow::from).collect();
    let c = &config.collector;

    let mut sections = vec![
        output::render_detail(&[
            ("Listen", config.listen_addr()?.to_string()),
            ("Sample", format!("{}s", c.sample_interval_secs)),
            (
                "Backoff",
                format!("{}s..{}s", c.backoff_base_secs, c.backoff_max_secs),
            ),
            (
                "Stale",
                format!(
                    "after {}s, checked every {}s",
                    c.stale_threshold_secs, c.stale_check_interval_secs
                ),
            ),
        ]),
        output::render_table(&devices),
    ];
    if !links.is_empty() {
        sections.push(output::render_table(&links));
    }
    Ok(sections.join("\n\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridtel_config::{CollectorSection, DeviceEntry, EndpointEntry, LinkEntry};

    use super::*;

    fn config() -> Config {
        let device = |id: &str| DeviceEntry {
            id: id.into(),
            name: None,
            host: "192.0.2.10".into(),
            port: 57400,
            role: gridtel_core::DeviceRole::Spine,
            credentials: gridtel_config::CredentialSection::default(),
        };
        Config {
            collector: CollectorSection::default(),
            devices: vec![device("spine1"), device("leaf1")],
            links: vec![LinkEntry {
                id: "spine1-leaf1".into(),
                a: EndpointEntry {
                    device: "spine1".into(),
                    interface: "ethernet-1/1".into(),
                },
                b: EndpointEntry {
                    device: "leaf1".into(),
                    interface: "ethernet-1/49".into(),
                },
            }],
            ..Config::default()
        }
    }

    #[test]
    fn summary_lists_devices_and_links() {
        let config = config();
        let roster = config.roster().unwrap();
        let out = render(&config, &roster).unwrap();

        assert!(out.contains("Listen:  0.0.0.0:3000"));
        assert!(out.contains("192.0.2.10:57400"));
        assert!(out.contains("spine1 ethernet-1/1"));
        assert!(out.find("spine1").unwrap() < out.find("leaf1").unwrap());
    }
}
