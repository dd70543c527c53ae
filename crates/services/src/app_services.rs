use std::sync::Arc;

use storage::repository::Storage;
use tutor_core::Catalog;

use crate::Clock;
use crate::assessment_service::AssessmentService;
use crate::error::AppServicesError;
use crate::gradebook::{GradebookClient, GradebookConfig, GradebookReporter, HttpGradebookClient};
use crate::lessons::LessonLoopService;
use crate::rng::RandomSource;

/// Assembles app-facing services for one learner.
#[derive(Clone)]
pub struct AppServices {
    student_id: String,
    storage: Storage,
    gradebook: GradebookReporter,
    lessons: Arc<LessonLoopService>,
    assessment: Arc<AssessmentService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// The gradebook is configured from the environment and stays disabled
    /// when `TUTOR_GRADEBOOK_URL` is unset.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, the catalog, or
    /// the gradebook configuration fails.
    pub async fn new_sqlite(
        db_url: &str,
        student_id: &str,
        clock: Clock,
        random: RandomSource,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, student_id).await?;
        let client = match GradebookConfig::from_env()? {
            Some(config) => {
                Some(Arc::new(HttpGradebookClient::new(config)?) as Arc<dyn GradebookClient>)
            }
            None => None,
        };
        Self::with_storage(
            storage,
            student_id,
            clock,
            random,
            GradebookReporter::new(client),
        )
    }

    /// Build services over in-memory progress.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the built-in catalog is invalid.
    pub fn in_memory(
        student_id: &str,
        clock: Clock,
        random: RandomSource,
    ) -> Result<Self, AppServicesError> {
        Self::with_storage(
            Storage::in_memory(),
            student_id,
            clock,
            random,
            GradebookReporter::default(),
        )
    }

    fn with_storage(
        storage: Storage,
        student_id: &str,
        clock: Clock,
        random: RandomSource,
        gradebook: GradebookReporter,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(Catalog::standard()?);
        // Separate streams so lesson and assessment draws stay independent.
        let (lesson_rng, assessment_rng) = match random {
            RandomSource::Entropy => (RandomSource::Entropy, RandomSource::Entropy),
            RandomSource::Seeded(seed) => (
                RandomSource::Seeded(seed),
                RandomSource::Seeded(seed.wrapping_add(1)),
            ),
        };

        let lessons = Arc::new(
            LessonLoopService::new(
                clock,
                Arc::clone(&catalog),
                Arc::clone(&storage.progress),
                student_id,
            )
            .with_gradebook(gradebook.clone())
            .with_random_source(lesson_rng),
        );
        let assessment = Arc::new(
            AssessmentService::new(clock, catalog, Arc::clone(&storage.progress), student_id)
                .with_gradebook(gradebook.clone())
                .with_random_source(assessment_rng),
        );

        Ok(Self {
            student_id: student_id.to_owned(),
            storage,
            gradebook,
            lessons,
            assessment,
        })
    }

    #[must_use]
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Shared by both services; flush it before exiting.
    #[must_use]
    pub fn gradebook(&self) -> &GradebookReporter {
        &self.gradebook
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonLoopService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn assessment(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessment)
    }
}
