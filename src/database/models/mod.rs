pub mod beeyard;
pub mod choices;
pub mod contact;
pub mod contamination;
pub mod detail;
pub mod hive;
pub mod intervention;
pub mod reference;
pub mod user;

pub use beeyard::{BeeYard, BeeYardDraft};
pub use choices::{
    BeeSpecies, ChoiceError, ContaminationType, DetailKind, HiveStatus, InterventionType,
    SyrupType, TreatmentType,
};
pub use contact::{ContactEntry, PublicContact};
pub use contamination::{Contamination, ContaminationDraft};
pub use detail::{Harvest, SyrupDistribution, Treatment};
pub use hive::{Hive, HiveDraft};
pub use intervention::{DetailDraft, Intervention, InterventionDraft};
pub use reference::{DetailRef, ReferenceError};
pub use user::{NewUser, User, UserId};
