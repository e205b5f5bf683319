// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::AppResult;
use crate::model::{Asset, Customer, Site, Ticket, User, Vendor};
use crate::schema::{assets, customers, sites, users, vendors};
use diesel::prelude::*;
use std::collections::HashMap;

/// A company's related records keyed by ID, for turning ticket references into names.
#[derive(Debug, Default)]
pub struct NameLookup {
	pub customers: HashMap<String, Customer>,
	pub sites: HashMap<String, Site>,
	pub assets: HashMap<String, Asset>,
	pub vendors: HashMap<String, Vendor>,
	pub users: HashMap<String, User>,
}

impl NameLookup {
	pub fn load(db_connection: &mut PgConnection, company_code: &str) -> AppResult<Self> {
		let customers: Vec<Customer> = customers::table
			.filter(customers::company_code.eq(company_code))
			.load(db_connection)?;
		let sites: Vec<Site> = sites::table
			.filter(sites::company_code.eq(company_code))
			.load(db_connection)?;
		let assets: Vec<Asset> = assets::table
			.filter(assets::company_code.eq(company_code))
			.load(db_connection)?;
		let vendors: Vec<Vendor> = vendors::table
			.filter(vendors::company_code.eq(company_code))
			.load(db_connection)?;
		let users: Vec<User> = users::table
			.filter(users::company_code.eq(company_code))
			.load(db_connection)?;

		Ok(Self {
			customers: customers.into_iter().map(|c| (c.id.clone(), c)).collect(),
			sites: sites.into_iter().map(|s| (s.id.clone(), s)).collect(),
			assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
			vendors: vendors.into_iter().map(|v| (v.id.clone(), v)).collect(),
			users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
		})
	}

	pub fn customer_name(&self, id: Option<&str>) -> Option<String> {
		id.and_then(|id| self.customers.get(id)).map(|customer| customer.name.clone())
	}

	pub fn site(&self, id: Option<&str>) -> Option<&Site> {
		id.and_then(|id| self.sites.get(id))
	}

	pub fn site_name(&self, id: Option<&str>) -> Option<String> {
		self.site(id).map(|site| site.name.clone())
	}

	pub fn asset_name(&self, id: Option<&str>) -> Option<String> {
		id.and_then(|id| self.assets.get(id)).map(|asset| asset.name.clone())
	}

	pub fn vendor_name(&self, id: Option<&str>) -> Option<String> {
		id.and_then(|id| self.vendors.get(id)).map(|vendor| vendor.name.clone())
	}

	pub fn user_name(&self, id: Option<&str>) -> Option<String> {
		id.and_then(|id| self.users.get(id)).map(|user| user.display_name.clone())
	}

	/// Resolves every reference on a ticket.
	pub fn ticket_names(&self, ticket: &Ticket) -> TicketNames {
		TicketNames {
			customer_name: self.customer_name(ticket.customer_id.as_deref()),
			site_name: self.site_name(ticket.site_id.as_deref()),
			site_address: self
				.site(ticket.site_id.as_deref())
				.and_then(|site| site.full_address()),
			asset_name: self.asset_name(ticket.asset_id.as_deref()),
			vendor_name: self.vendor_name(ticket.vendor_id.as_deref()),
			assignee_name: self.user_name(ticket.assigned_to.as_deref()),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketNames {
	pub customer_name: Option<String>,
	pub site_name: Option<String>,
	pub site_address: Option<String>,
	pub asset_name: Option<String>,
	pub vendor_name: Option<String>,
	pub assignee_name: Option<String>,
}
