//! In-memory `ProfileDirectory` shared by the unit tests in this crate.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use thiserror::Error;
use uuid::Uuid;

use crate::{
  directory::ProfileDirectory,
  profile::{AccountProfile, County, OfficeType, StateCode},
  role::Role,
  subject::Subject,
};

#[derive(Debug, Error)]
#[error("directory unavailable")]
pub struct Unavailable;

#[derive(Default)]
pub struct MemoryDirectory {
  profiles:            Mutex<HashMap<Uuid, AccountProfile>>,
  districts:           HashMap<String, County>,
  counties:            BTreeMap<StateCode, BTreeSet<County>>,
  /// When set, every lookup fails.
  pub unavailable:     AtomicBool,
  /// Number of `all_states_across_profiles` calls served.
  pub aggregate_reads: AtomicUsize,
}

impl MemoryDirectory {
  pub fn with_profile(self, id: Uuid, profile: AccountProfile) -> Self {
    self.insert(id, profile);
    self
  }

  pub fn with_district(mut self, district_id: &str, county: &str) -> Self {
    self.districts.insert(district_id.to_owned(), County::new(county));
    self
  }

  pub fn with_counties(mut self, state: &str, counties: &[&str]) -> Self {
    self
      .counties
      .entry(st(state))
      .or_default()
      .extend(counties.iter().map(|c| County::new(*c)));
    self
  }

  pub fn insert(&self, id: Uuid, profile: AccountProfile) {
    self.profiles.lock().unwrap().insert(id, profile);
  }

  pub fn remove(&self, id: Uuid) {
    self.profiles.lock().unwrap().remove(&id);
  }

  fn check(&self) -> Result<(), Unavailable> {
    if self.unavailable.load(Ordering::SeqCst) {
      Err(Unavailable)
    } else {
      Ok(())
    }
  }
}

impl ProfileDirectory for MemoryDirectory {
  type Error = Unavailable;

  async fn resolve_profile(
    &self,
    subject_id: Uuid,
  ) -> Result<Option<AccountProfile>, Unavailable> {
    self.check()?;
    Ok(self.profiles.lock().unwrap().get(&subject_id).cloned())
  }

  async fn resolve_county_from_district(
    &self,
    district_id: &str,
  ) -> Result<Option<County>, Unavailable> {
    self.check()?;
    Ok(self.districts.get(district_id).cloned())
  }

  async fn all_states_across_profiles(
    &self,
  ) -> Result<BTreeSet<StateCode>, Unavailable> {
    self.check()?;
    self.aggregate_reads.fetch_add(1, Ordering::SeqCst);
    Ok(
      self
        .profiles
        .lock()
        .unwrap()
        .values()
        .filter(|p| !matches!(p, AccountProfile::Vendor { .. }))
        .filter_map(|p| p.home_state().cloned())
        .collect(),
    )
  }

  async fn all_counties_in_state(
    &self,
    state: &StateCode,
  ) -> Result<BTreeSet<County>, Unavailable> {
    self.check()?;
    Ok(self.counties.get(state).cloned().unwrap_or_default())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

pub fn st(code: &str) -> StateCode { StateCode::parse(code).unwrap() }

pub fn county(name: &str) -> County { County::new(name) }

/// The subjects of the reference scenario: a State officer for CA, a County
/// officer for (CA, Los Angeles), a county-office campaign in Los Angeles, a
/// statewide campaign in CA, a vendor serving CA and TX, and an owner.
pub struct Scenario {
  pub owner:              Subject,
  pub state:              Subject,
  pub state_tx:           Subject,
  pub county:             Subject,
  pub county_orange:      Subject,
  pub campaign:           Subject,
  pub campaign_statewide: Subject,
  pub campaign_tx:        Subject,
  pub vendor:             Subject,
  pub vendor_ny:          Subject,
}

pub fn scenario() -> (MemoryDirectory, Scenario) {
  let s = Scenario {
    owner:              Subject::new(Uuid::new_v4(), Role::Owner),
    state:              Subject::new(Uuid::new_v4(), Role::State),
    state_tx:           Subject::new(Uuid::new_v4(), Role::State),
    county:             Subject::new(Uuid::new_v4(), Role::County),
    county_orange:      Subject::new(Uuid::new_v4(), Role::County),
    campaign:           Subject::new(Uuid::new_v4(), Role::Campaign),
    campaign_statewide: Subject::new(Uuid::new_v4(), Role::Campaign),
    campaign_tx:        Subject::new(Uuid::new_v4(), Role::Campaign),
    vendor:             Subject::new(Uuid::new_v4(), Role::Vendor),
    vendor_ny:          Subject::new(Uuid::new_v4(), Role::Vendor),
  };

  let dir = MemoryDirectory::default()
    .with_counties("CA", &["Los Angeles", "Orange", "San Diego"])
    .with_counties("TX", &["Travis", "Harris"])
    .with_counties("NY", &["Kings"])
    .with_district("ca-la-34", "Los Angeles")
    .with_district("tx-travis-3", "Travis")
    .with_profile(s.owner.subject_id, AccountProfile::Owner)
    .with_profile(s.state.subject_id, AccountProfile::State { state: st("CA") })
    .with_profile(s.state_tx.subject_id, AccountProfile::State { state: st("TX") })
    .with_profile(s.county.subject_id, AccountProfile::County {
      state:  st("CA"),
      county: county("Los Angeles"),
    })
    .with_profile(s.county_orange.subject_id, AccountProfile::County {
      state:  st("CA"),
      county: county("Orange"),
    })
    .with_profile(s.campaign.subject_id, AccountProfile::Campaign {
      state:       st("CA"),
      office_type: OfficeType::County,
      district_id: Some("ca-la-34".into()),
    })
    .with_profile(s.campaign_statewide.subject_id, AccountProfile::Campaign {
      state:       st("CA"),
      office_type: OfficeType::State,
      district_id: None,
    })
    .with_profile(s.campaign_tx.subject_id, AccountProfile::Campaign {
      state:       st("TX"),
      office_type: OfficeType::County,
      district_id: Some("tx-travis-3".into()),
    })
    .with_profile(s.vendor.subject_id, AccountProfile::Vendor {
      states_served: [st("CA"), st("TX")].into_iter().collect(),
    })
    .with_profile(s.vendor_ny.subject_id, AccountProfile::Vendor {
      states_served: [st("NY")].into_iter().collect(),
    });

  (dir, s)
}
