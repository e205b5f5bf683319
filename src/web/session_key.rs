// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub const USER_ID: &str = "user_id";
/// The company an administrator has switched to for their page session
pub const ACTIVE_COMPANY: &str = "active_company";
pub const LOGIN_RETURN_PATH: &str = "login_return_path";
