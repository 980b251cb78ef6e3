use clap::Subcommand;
use serde::Serialize;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::models::{
    BeeSpecies, BeeYardDraft, ContaminationDraft, ContaminationType, DetailDraft, DetailRef, Hive,
    HiveDraft, HiveStatus, InterventionDraft, InterventionType, NewUser, SyrupType, TreatmentType,
};
use crate::database::{ApiaryStore, PgStore};

/// Shared by every demo account.
pub const FIXTURE_PASSWORD: &str = "Bees4ever!";

const KEEPERS: [(&str, &str); 10] = [
    ("Idgie", "Threadgood"),
    ("Frank", "Wang"),
    ("Alice", "Taylor"),
    ("Ivy", "Clark"),
    ("David", "Lee"),
    ("Eva", "Aldridge"),
    ("Grace", "Johnson"),
    ("Henry", "Garcia"),
    ("Charlie", "Brown"),
    ("Jodie", "Taylor"),
];

const HIVE_NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load the demo beekeepers, yards, hives and interventions")]
    Load,
}

#[derive(Debug, Default, Serialize)]
pub struct FixtureSummary {
    pub users: usize,
    pub public_contacts: usize,
    pub beeyards: usize,
    pub hives: usize,
    pub interventions: usize,
    pub contaminations: usize,
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load => {
            let store = PgStore::new(connect().await?);
            let summary = load(&store).await?;
            output_success(
                output_format,
                &format!(
                    "Loaded {} beekeepers, {} hives and {} interventions",
                    summary.users, summary.hives, summary.interventions
                ),
                Some(json!({ "summary": summary })),
            )
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Deterministic demo data. Keepers with a `d` in their username keep their
/// contact private.
pub async fn load(store: &dyn ApiaryStore) -> anyhow::Result<FixtureSummary> {
    let mut summary = FixtureSummary::default();
    let password_hash = hash_password(FIXTURE_PASSWORD)?;
    let mut hives: Vec<Hive> = Vec::new();
    // Index into KEEPERS for each hive
    let mut keepers: Vec<usize> = Vec::new();

    for (u, (first_name, last_name)) in KEEPERS.iter().enumerate() {
        let username = format!("{}{}", first_name, last_name);
        let user = store
            .insert_user(NewUser {
                username: username.clone(),
                password_hash: password_hash.clone(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!("{}@testmail.com", username),
            })
            .await?;
        summary.users += 1;

        if !username.to_lowercase().contains('d') {
            store.publish_contact(user.id).await?;
            summary.public_contacts += 1;
        }

        for i in 0..(1 + u % 4) {
            let prefix: String = username.chars().skip(2).take(4).collect();
            let yard = store
                .insert_beeyard(BeeYardDraft {
                    name: format!("{}{}", prefix, i),
                    beekeeper_id: Some(user.id),
                })
                .await?;
            summary.beeyards += 1;

            for (j, name) in HIVE_NAMES.iter().enumerate().take(1 + (u + i) % 5) {
                let status = match j {
                    3 => HiveStatus::Destroyed,
                    4 => HiveStatus::Pending,
                    _ => HiveStatus::Active,
                };
                let hive = store
                    .insert_hive(HiveDraft {
                        name: name.to_string(),
                        status,
                        species: BeeSpecies::ALL[i % BeeSpecies::ALL.len()],
                        beeyard_id: Some(yard.id),
                        queen_year: 2020 + (i % 3) as i32,
                    })
                    .await?;
                hives.push(hive);
                keepers.push(u);
            }
        }
    }
    summary.hives = hives.len();

    let mut drafts = Vec::new();

    // Treatments after a contamination, on spread-out hives
    for k in 0..6 {
        let hive = &hives[(k * 7) % hives.len()];
        let (contamination_type, treatment_type) = match k {
            0 | 1 => (ContaminationType::Illness, TreatmentType::Antifungal),
            2 | 3 => (ContaminationType::Parasite, TreatmentType::Apivar),
            _ => (ContaminationType::Parasite, TreatmentType::OxalicAcid),
        };
        store
            .insert_contamination(ContaminationDraft {
                contamination_type,
                hive_id: hive.id,
            })
            .await?;
        summary.contaminations += 1;

        let treatment = store.ensure_treatment(treatment_type).await?;
        drafts.push(InterventionDraft {
            intervention_type: InterventionType::Treatment,
            hive_affected_id: hive.id,
            detail: DetailDraft::Existing(DetailRef::Treatment(treatment.id)),
        });
    }

    let quarter = hives.len() / 4;
    for (i, hive) in hives.iter().enumerate() {
        let syrup_type = if i <= quarter {
            SyrupType::Nectar
        } else if i <= quarter * 2 {
            SyrupType::CaneSugar
        } else if i <= quarter * 3 {
            SyrupType::WhiteSugar
        } else {
            SyrupType::RawSugar
        };
        drafts.push(InterventionDraft {
            intervention_type: InterventionType::SyrupDistribution,
            hive_affected_id: hive.id,
            detail: DetailDraft::SyrupDistribution {
                syrup_type,
                quantity: round2(((i % 4) + 1) as f64 / 4.0),
            },
        });

        for k in 0..2 {
            drafts.push(InterventionDraft {
                intervention_type: InterventionType::Harvest,
                hive_affected_id: hive.id,
                detail: DetailDraft::Harvest {
                    quantity: round2(((i + k) % 5 + 1) as f64 / 7.0),
                },
            });
        }

        // A swarm only lands in another hive of the same keeper
        let sibling = hives
            .iter()
            .enumerate()
            .find(|(k, _)| *k != i && keepers[*k] == keepers[i])
            .map(|(_, h)| h.id);
        let extra = match sibling {
            Some(child) if i % 3 != 0 && i % 5 != 0 => InterventionDraft {
                intervention_type: InterventionType::ArtificialSwarming,
                hive_affected_id: hive.id,
                detail: DetailDraft::Existing(DetailRef::Hive(child)),
            },
            _ if i % 5 == 0 && i % 3 != 0 => InterventionDraft::bare(InterventionType::DestructionQueenCells, hive.id),
            _ => InterventionDraft::bare(InterventionType::HealthCheck, hive.id),
        };
        drafts.push(extra);
    }

    summary.interventions = store.insert_interventions(drafts).await?.len();
    tracing::info!(?summary, "fixture loaded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::filter::FilterSet;
    use crate::ownership::Scope;

    #[tokio::test]
    async fn loads_a_consistent_apiary() {
        let store = MemoryStore::new();
        let summary = load(&store).await.unwrap();

        assert_eq!(summary.users, 10);
        // DavidLee, EvaAldridge, JodieTaylor keep their contact private
        assert_eq!(summary.public_contacts, 7);
        assert_eq!(summary.contaminations, 6);
        // treatment x6, then syrup + two harvests + one extra per hive
        assert_eq!(summary.interventions, 6 + 4 * summary.hives);

        let treatments = store
            .list_interventions(Scope::Everyone, &FilterSet::none(), None)
            .await
            .unwrap()
            .rows
            .into_iter()
            .filter(|i| i.intervention_type == InterventionType::Treatment)
            .count();
        assert_eq!(treatments, 6);

        let yards = store
            .list_beeyards(Scope::Everyone, &FilterSet::none(), None)
            .await
            .unwrap();
        assert_eq!(yards.total as usize, summary.beeyards);
    }
}
