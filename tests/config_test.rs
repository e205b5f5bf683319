// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use fieldline::config::parse_config;
use std::io::Write;

#[tokio::test]
async fn config_is_read_from_a_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	write!(
		file,
		r#"
		database {{
			host "db.internal"
			port 5433
			username "fieldline"
			password "secret"
			database "fieldline"
		}}
		web {{
			bind_addr "0.0.0.0:8080"
			base_url "https://service.example.com"
			attachment_dir "/var/lib/fieldline/attachments"
		}}
		"#
	)
	.unwrap();

	let config = parse_config(file.path().to_str().unwrap()).await.unwrap();
	assert_eq!(config.database.port, Some(5433));
	assert_eq!(config.web.base_url, "https://service.example.com");
	assert_eq!(
		config.web.attachment_dir,
		std::path::PathBuf::from("/var/lib/fieldline/attachments")
	);
}

#[tokio::test]
async fn missing_config_file_is_an_error() {
	let directory = tempfile::tempdir().unwrap();
	let path = directory.path().join("absent.kdl");
	assert!(parse_config(path.to_str().unwrap()).await.is_err());
}
