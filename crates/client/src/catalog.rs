//! Course catalog reads
//!
//! Each fetch replaces one cache slot on success. On failure the error is
//! logged and the slot keeps its previous contents.

use crate::api::RequestOptions;
use crate::outcome::FetchOutcome;
use crate::session::SessionManager;
use crate::types::{Course, CourseFilter, Task, Topic};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

const COURSES_PATH: &str = "/api/courses/";
const TOPICS_PATH: &str = "/api/topics/";
const TASKS_PATH: &str = "/api/tasks/";

/// Last successfully fetched catalog data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogCache {
    pub courses: Vec<Course>,
    pub my_courses: Vec<Course>,
    pub current_course: Option<Course>,
    pub current_topics: Vec<Topic>,
    pub current_tasks: Vec<Task>,
}

struct CatalogInner {
    session: SessionManager,
    cache: Mutex<CatalogCache>,
}

/// Read-only catalog accessor. Clones share one cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogInner>,
}

impl CatalogClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                session,
                cache: Mutex::new(CatalogCache::default()),
            }),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    fn lock(&self) -> MutexGuard<'_, CatalogCache> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of every cache slot
    pub fn cache(&self) -> CatalogCache {
        self.lock().clone()
    }

    pub fn courses(&self) -> Vec<Course> {
        self.lock().courses.clone()
    }

    pub fn my_courses(&self) -> Vec<Course> {
        self.lock().my_courses.clone()
    }

    pub fn current_course(&self) -> Option<Course> {
        self.lock().current_course.clone()
    }

    pub fn current_topics(&self) -> Vec<Topic> {
        self.lock().current_topics.clone()
    }

    pub fn current_tasks(&self) -> Vec<Task> {
        self.lock().current_tasks.clone()
    }

    pub fn clear_cache(&self) {
        *self.lock() = CatalogCache::default();
    }

    /// List catalog courses.
    ///
    /// The listing is public: without a session the request goes out
    /// anonymously, with one it carries the bearer token.
    pub async fn fetch_courses(&self, filter: &CourseFilter) -> FetchOutcome {
        let options = RequestOptions {
            query: filter.to_query(),
            ..RequestOptions::get()
        };

        if self.inner.session.is_authenticated() {
            return self
                .fetch_authenticated("courses", COURSES_PATH, options, |cache, courses| {
                    cache.courses = courses;
                })
                .await;
        }

        let api = self.inner.session.api();
        match api
            .execute::<Vec<Course>>(api.request_with(COURSES_PATH, &options, None))
            .await
        {
            Ok(courses) => {
                debug!(count = courses.len(), "public course list loaded");
                self.lock().courses = courses;
                FetchOutcome::Updated
            }
            Err(e) => {
                error!(error = %e, "failed to load courses");
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Courses of the current user, optionally narrowed to one id
    pub async fn fetch_my_courses(&self, id: Option<u64>) -> FetchOutcome {
        let mut options = RequestOptions::get();
        if let Some(id) = id {
            options = options.query("id", id);
        }
        self.fetch_authenticated("my courses", COURSES_PATH, options, |cache, courses| {
            cache.my_courses = courses;
        })
        .await
    }

    pub async fn fetch_course(&self, id: u64) -> FetchOutcome {
        let path = format!("{COURSES_PATH}{id}/");
        self.fetch_authenticated("course", &path, RequestOptions::get(), |cache, course| {
            cache.current_course = Some(course);
        })
        .await
    }

    pub async fn fetch_topics(&self) -> FetchOutcome {
        self.fetch_authenticated("topics", TOPICS_PATH, RequestOptions::get(), |cache, topics| {
            cache.current_topics = topics;
        })
        .await
    }

    pub async fn fetch_tasks(&self) -> FetchOutcome {
        self.fetch_authenticated("tasks", TASKS_PATH, RequestOptions::get(), |cache, tasks| {
            cache.current_tasks = tasks;
        })
        .await
    }

    async fn fetch_authenticated<T, F>(
        &self,
        what: &'static str,
        path: &str,
        options: RequestOptions,
        store: F,
    ) -> FetchOutcome
    where
        T: DeserializeOwned,
        F: FnOnce(&mut CatalogCache, T),
    {
        let session = &self.inner.session;
        let generation = session.generation();

        match session.auth_fetch::<T>(path, options).await {
            Ok(value) => {
                let mut cache = self.lock();
                if session.generation() != generation {
                    debug!(what, "discarding response from an ended session");
                    return FetchOutcome::Stale;
                }
                store(&mut cache, value);
                debug!(what, "catalog cache updated");
                FetchOutcome::Updated
            }
            Err(e) => {
                error!(what, path, error = %e, "catalog request failed");
                FetchOutcome::Failed(e)
            }
        }
    }
}
