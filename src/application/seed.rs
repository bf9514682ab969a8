//! Synthetic catalog generation for load testing.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::application::repos::{NewSeedTranslation, RepoError, SeedRepo};
use crate::domain::entities::{LocaleRecord, TagRecord};
use crate::domain::error::ValidationErrors;

pub const DEFAULT_LOCALES: &[(&str, &str)] = &[("en", "English"), ("fr", "French"), ("es", "Spanish")];
pub const DEFAULT_TAGS: &[&str] = &["mobile", "desktop", "web"];
pub const MAX_CHUNK: usize = 5000;

const SECTIONS: &[&str] = &["checkout", "home", "profile", "settings", "errors"];
const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    total: usize,
    chunk: usize,
    run: String,
}

impl SeedPlan {
    pub fn new(total: usize, chunk: usize) -> Result<Self, ValidationErrors> {
        let run = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self::with_run(total, chunk, run)
    }

    /// Plan with a fixed run prefix. Keys from different runs never collide.
    pub fn with_run(
        total: usize,
        chunk: usize,
        run: impl Into<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if chunk == 0 {
            errors.add("chunk", "Chunk size must be at least 1.");
        } else if chunk > MAX_CHUNK {
            errors.add("chunk", format!("Chunk size must not exceed {MAX_CHUNK}."));
        }
        errors.into_result()?;

        Ok(Self {
            total,
            chunk,
            run: run.into(),
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn chunk(&self) -> usize {
        self.chunk
    }

    pub fn chunk_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.total)
            .step_by(self.chunk)
            .map(|start| start..(start + self.chunk).min(self.total))
    }

    /// Deterministic rows for `range`, spread over `locales` with 1 to 3 tags each.
    pub fn rows(
        &self,
        range: Range<usize>,
        locales: &[LocaleRecord],
        tags: &[TagRecord],
    ) -> Vec<NewSeedTranslation> {
        if locales.is_empty() {
            return Vec::new();
        }

        range
            .map(|index| {
                let locale = &locales[index % locales.len()];
                let section = SECTIONS[index % SECTIONS.len()];
                let tag_count = if tags.is_empty() {
                    0
                } else {
                    1 + index % tags.len().min(3)
                };
                let tag_ids = (0..tag_count)
                    .map(|offset| tags[(index + offset) % tags.len()].id)
                    .collect();

                NewSeedTranslation {
                    key: format!("seed.{}.{section}.item_{index}", self.run),
                    content: sentence(index, &locale.code),
                    locale_id: locale.id,
                    tag_ids,
                }
            })
            .collect()
    }
}

fn sentence(index: usize, locale_code: &str) -> String {
    let words: Vec<&str> = (0..4).map(|i| WORDS[(index + i * 3) % WORDS.len()]).collect();
    format!("[{locale_code}] {} #{index}", words.join(" "))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub chunks: usize,
}

pub struct CatalogSeeder {
    repo: Arc<dyn SeedRepo>,
}

impl CatalogSeeder {
    pub fn new(repo: Arc<dyn SeedRepo>) -> Self {
        Self { repo }
    }

    pub async fn run(&self, plan: &SeedPlan) -> Result<SeedReport, RepoError> {
        info!(
            target = "application::seed::run",
            total = plan.total(),
            chunk = plan.chunk(),
            "Seeding {} translations in chunks of {}...",
            plan.total(),
            plan.chunk()
        );

        let started_at = Instant::now();
        let locales = self.repo.ensure_locales(DEFAULT_LOCALES).await?;
        let tags = self.repo.ensure_tags(DEFAULT_TAGS).await?;

        let mut report = SeedReport::default();
        for range in plan.chunk_ranges() {
            let chunk_started_at = Instant::now();
            let rows = plan.rows(range, &locales, &tags);
            report.inserted += self.repo.insert_seed_chunk(&rows).await?;
            report.chunks += 1;

            info!(
                target = "application::seed::run",
                inserted = report.inserted,
                chunk_ms = chunk_started_at.elapsed().as_millis() as u64,
                "Seeded {} translations so far",
                report.inserted
            );
        }

        info!(
            target = "application::seed::run",
            inserted = report.inserted,
            chunks = report.chunks,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Seeder completed."
        );

        Ok(report)
    }
}
