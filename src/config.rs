// © 2024 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::domain::sla::SlaTable;
use kdl::{KdlDocument, KdlValue};
use miette::{IntoDiagnostic, Result, miette};
use std::path::PathBuf;
use tokio::fs::read_to_string;

pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 720;
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

pub async fn parse_config(config_path: &str) -> Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	parse_config_str(&config_file_contents)
}

/// Parses the contents of a config file.
pub fn parse_config_str(contents: &str) -> Result<ConfigData> {
	let document: KdlDocument = contents.parse()?;

	let database = section(&document, "database")?.ok_or_else(|| miette!("Missing required `database` section"))?;
	let database = DatabaseArgs {
		host: required_string(database, "database", "host")?,
		port: optional_integer(database, "database", "port")?,
		username: required_string(database, "database", "username")?,
		password: required_string(database, "database", "password")?,
		database: required_string(database, "database", "database")?,
	};

	let web = section(&document, "web")?.ok_or_else(|| miette!("Missing required `web` section"))?;
	let bind_addr = required_string(web, "web", "bind_addr")?;
	let web = WebArgs {
		base_url: optional_string(web, "web", "base_url")?.unwrap_or_else(|| format!("http://{}", bind_addr)),
		bind_addr,
		attachment_dir: optional_string(web, "web", "attachment_dir")?
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from("attachments")),
		max_attachment_bytes: optional_integer(web, "web", "max_attachment_bytes")?
			.unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES),
	};

	let auth = match section(&document, "auth")? {
		Some(auth) => AuthArgs {
			token_lifetime_hours: optional_integer(auth, "auth", "token_lifetime_hours")?
				.unwrap_or(DEFAULT_TOKEN_LIFETIME_HOURS),
			pepper: optional_string(auth, "auth", "pepper")?,
		},
		None => AuthArgs::default(),
	};

	let sla = match section(&document, "sla")? {
		Some(sla) => {
			let defaults = SlaTable::default();
			SlaTable {
				critical_hours: optional_integer(sla, "sla", "critical")?.unwrap_or(defaults.critical_hours),
				high_hours: optional_integer(sla, "sla", "high")?.unwrap_or(defaults.high_hours),
				normal_hours: optional_integer(sla, "sla", "normal")?.unwrap_or(defaults.normal_hours),
				low_hours: optional_integer(sla, "sla", "low")?.unwrap_or(defaults.low_hours),
			}
		}
		None => SlaTable::default(),
	};
	for hours in [sla.critical_hours, sla.high_hours, sla.normal_hours, sla.low_hours] {
		if hours <= 0 {
			return Err(miette!("SLA hours must be positive (got {})", hours));
		}
	}

	let bootstrap = match section(&document, "bootstrap")? {
		Some(bootstrap) => Some(BootstrapArgs {
			company_code: required_string(bootstrap, "bootstrap", "company_code")?,
			company_name: required_string(bootstrap, "bootstrap", "company_name")?,
			admin_username: required_string(bootstrap, "bootstrap", "admin_username")?,
			admin_password: required_string(bootstrap, "bootstrap", "admin_password")?,
		}),
		None => None,
	};

	Ok(ConfigData {
		database,
		web,
		auth,
		sla,
		bootstrap,
	})
}

fn section<'a>(document: &'a KdlDocument, name: &str) -> Result<Option<&'a KdlDocument>> {
	match document.get(name) {
		Some(node) => match node.children() {
			Some(children) => Ok(Some(children)),
			None => Err(miette!("The `{}` section must have a block of settings", name)),
		},
		None => Ok(None),
	}
}

fn setting<'a>(section: &'a KdlDocument, section_name: &str, key: &str) -> Result<Option<&'a KdlValue>> {
	match section.get(key) {
		Some(node) => match node.entries().first() {
			Some(entry) if entry.name().is_none() => Ok(Some(entry.value())),
			_ => Err(miette!("`{}.{}` needs a value", section_name, key)),
		},
		None => Ok(None),
	}
}

fn optional_string(section: &KdlDocument, section_name: &str, key: &str) -> Result<Option<String>> {
	match setting(section, section_name, key)? {
		Some(value) => match value.as_string() {
			Some(value) => Ok(Some(value.to_string())),
			None => Err(miette!("`{}.{}` must be a string", section_name, key)),
		},
		None => Ok(None),
	}
}

fn required_string(section: &KdlDocument, section_name: &str, key: &str) -> Result<String> {
	optional_string(section, section_name, key)?.ok_or_else(|| miette!("Missing `{}.{}`", section_name, key))
}

fn optional_integer<T: TryFrom<i128>>(section: &KdlDocument, section_name: &str, key: &str) -> Result<Option<T>> {
	match setting(section, section_name, key)? {
		Some(value) => {
			let Some(value) = value.as_integer() else {
				return Err(miette!("`{}.{}` must be an integer", section_name, key));
			};
			match T::try_from(value) {
				Ok(value) => Ok(Some(value)),
				Err(_) => Err(miette!("`{}.{}` is out of range", section_name, key)),
			}
		}
		None => Ok(None),
	}
}

#[derive(Clone, Debug)]
pub struct ConfigData {
	pub database: DatabaseArgs,
	pub web: WebArgs,
	pub auth: AuthArgs,
	pub sla: SlaTable,
	pub bootstrap: Option<BootstrapArgs>,
}

#[derive(Clone, Debug)]
pub struct DatabaseArgs {
	pub host: String,
	pub port: Option<u16>,
	pub username: String,
	pub password: String,
	pub database: String,
}

#[derive(Clone, Debug)]
pub struct WebArgs {
	pub bind_addr: String,
	/// Public URL of the site, used for links in printed tickets
	pub base_url: String,
	/// Directory where uploaded attachment files are kept
	pub attachment_dir: PathBuf,
	pub max_attachment_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct AuthArgs {
	pub token_lifetime_hours: i64,
	/// Prepended to passwords before hashing. Changing it invalidates every stored password.
	pub pepper: Option<String>,
}

impl Default for AuthArgs {
	fn default() -> Self {
		Self {
			token_lifetime_hours: DEFAULT_TOKEN_LIFETIME_HOURS,
			pepper: None,
		}
	}
}

/// The first company and administrator, created when the database has no users.
#[derive(Clone, Debug)]
pub struct BootstrapArgs {
	pub company_code: String,
	pub company_name: String,
	pub admin_username: String,
	pub admin_password: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
		database {
			host "localhost"
			username "fieldline"
			password "secret"
			database "fieldline"
		}
		web {
			bind_addr "127.0.0.1:3000"
		}
	"#;

	#[test]
	fn minimal_config_gets_defaults() {
		let config = parse_config_str(MINIMAL).unwrap();
		assert_eq!(config.database.host, "localhost");
		assert_eq!(config.database.port, None);
		assert_eq!(config.web.base_url, "http://127.0.0.1:3000");
		assert_eq!(config.web.attachment_dir, PathBuf::from("attachments"));
		assert_eq!(config.web.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
		assert_eq!(config.auth.token_lifetime_hours, DEFAULT_TOKEN_LIFETIME_HOURS);
		assert_eq!(config.sla, SlaTable::default());
		assert!(config.bootstrap.is_none());
	}

	#[test]
	fn full_config_is_read() {
		let contents = format!(
			"{}{}",
			MINIMAL,
			r#"
			auth {
				token_lifetime_hours 24
				pepper "pepper!"
			}
			sla {
				critical 2
				low 96
			}
			bootstrap {
				company_code "HQ"
				company_name "Head Office"
				admin_username "admin"
				admin_password "change-me-now"
			}
			"#
		);
		let config = parse_config_str(&contents).unwrap();
		assert_eq!(config.auth.token_lifetime_hours, 24);
		assert_eq!(config.auth.pepper.as_deref(), Some("pepper!"));
		assert_eq!(config.sla.critical_hours, 2);
		assert_eq!(config.sla.high_hours, 8);
		assert_eq!(config.sla.low_hours, 96);
		let bootstrap = config.bootstrap.unwrap();
		assert_eq!(bootstrap.company_code, "HQ");
		assert_eq!(bootstrap.admin_username, "admin");
	}

	#[test]
	fn missing_sections_and_bad_values_are_errors() {
		assert!(parse_config_str("web { bind_addr \"0.0.0.0:3000\"; }").is_err());

		let bad_port = MINIMAL.replace("host \"localhost\"", "host \"localhost\"\nport \"five\"");
		assert!(parse_config_str(&bad_port).is_err());

		let bad_sla = format!("{}\nsla {{ high 0; }}", MINIMAL);
		assert!(parse_config_str(&bad_sla).is_err());

		assert!(parse_config_str("database {").is_err());
	}
}
