//! Encoding and decoding helpers between Ward domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! roles and office types their lowercase names.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use ward_core::{
  profile::{AccountProfile, County, OfficeType, StateCode},
  role::Role,
};

use crate::{Error, Result, store::Account};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Profile columns
// ──────────────────────────────────────────────────────────

/// The column values of a `profiles` row, as bound to an INSERT.
pub struct ProfileColumns {
  pub role:          &'static str,
  pub state:         Option<String>,
  pub county:        Option<String>,
  pub office_type:   Option<&'static str>,
  pub district_id:   Option<String>,
  pub vendor_states: Vec<String>,
}

pub fn encode_profile(profile: &AccountProfile) -> ProfileColumns {
  let mut cols = ProfileColumns {
    role:          encode_role(profile.role()),
    state:         None,
    county:        None,
    office_type:   None,
    district_id:   None,
    vendor_states: Vec::new(),
  };
  match profile {
    AccountProfile::Owner => {}
    AccountProfile::State { state } => cols.state = Some(state.to_string()),
    AccountProfile::County { state, county } => {
      cols.state = Some(state.to_string());
      cols.county = Some(county.to_string());
    }
    AccountProfile::Campaign { state, office_type, district_id } => {
      cols.state = Some(state.to_string());
      cols.office_type = Some(encode_office_type(*office_type));
      cols.district_id = district_id.clone();
    }
    AccountProfile::Vendor { states_served } => {
      cols.vendor_states = states_served.iter().map(ToString::to_string).collect();
    }
  }
  cols
}

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Owner => "owner",
    Role::State => "state",
    Role::County => "county",
    Role::Campaign => "campaign",
    Role::Vendor => "vendor",
  }
}

pub fn encode_office_type(o: OfficeType) -> &'static str {
  match o {
    OfficeType::Federal => "federal",
    OfficeType::State => "state",
    OfficeType::County => "county",
    OfficeType::Municipal => "municipal",
  }
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A `subjects` row as read from SQLite.
pub struct RawAccount {
  pub subject_id:    String,
  pub role:          String,
  pub password_hash: Option<String>,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      subject_id:    decode_uuid(&self.subject_id)?,
      role:          Role::parse(&self.role)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A `profiles` row plus the vendor states joined from `vendor_states`.
pub struct RawProfile {
  pub role:          String,
  pub state:         Option<String>,
  pub county:        Option<String>,
  pub office_type:   Option<String>,
  pub district_id:   Option<String>,
  pub vendor_states: Vec<String>,
}

impl RawProfile {
  pub fn into_profile(self, subject_id: Uuid) -> Result<AccountProfile> {
    let corrupt = |msg: &str| Error::CorruptProfile(subject_id, msg.to_owned());

    let state = || -> Result<StateCode> {
      let s = self.state.as_deref().ok_or_else(|| corrupt("missing state"))?;
      Ok(StateCode::parse(s)?)
    };

    let profile = match Role::parse(&self.role)? {
      Role::Owner => AccountProfile::Owner,
      Role::State => AccountProfile::State { state: state()? },
      Role::County => AccountProfile::County {
        state:  state()?,
        county: County::new(
          self.county.clone().ok_or_else(|| corrupt("missing county"))?,
        ),
      },
      Role::Campaign => AccountProfile::Campaign {
        state:       state()?,
        office_type: OfficeType::parse(
          self
            .office_type
            .as_deref()
            .ok_or_else(|| corrupt("missing office type"))?,
        )?,
        district_id: self.district_id.clone(),
      },
      Role::Vendor => AccountProfile::Vendor {
        states_served: self
          .vendor_states
          .iter()
          .map(|s| StateCode::parse(s))
          .collect::<Result<BTreeSet<_>, _>>()?,
      },
    };
    Ok(profile)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn campaign_row_decodes() {
    let raw = RawProfile {
      role:          "campaign".into(),
      state:         Some("CA".into()),
      county:        None,
      office_type:   Some("county".into()),
      district_id:   Some("ca-la-34".into()),
      vendor_states: vec![],
    };
    let profile = raw.into_profile(Uuid::new_v4()).unwrap();
    assert_eq!(profile, AccountProfile::Campaign {
      state:       StateCode::parse("CA").unwrap(),
      office_type: OfficeType::County,
      district_id: Some("ca-la-34".into()),
    });
  }

  #[test]
  fn county_row_without_county_is_corrupt() {
    let raw = RawProfile {
      role:          "county".into(),
      state:         Some("CA".into()),
      county:        None,
      office_type:   None,
      district_id:   None,
      vendor_states: vec![],
    };
    assert!(matches!(
      raw.into_profile(Uuid::new_v4()),
      Err(Error::CorruptProfile(_, _))
    ));
  }

  #[test]
  fn encoded_names_match_role_display() {
    for role in Role::ORDER {
      assert_eq!(encode_role(role), role.to_string());
    }
    assert_eq!(encode_office_type(OfficeType::Municipal), OfficeType::Municipal.as_ref());
  }
}
