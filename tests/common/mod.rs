//! Shared fixtures for manuscript integration tests

#![allow(dead_code)]

use manuscript::{ManuscriptApi, OpenStore, Project, ProjectId, SqliteStore, UserId};
use std::path::Path;
use std::sync::Arc;

pub struct Fixture {
    pub api: ManuscriptApi,
    pub owner: UserId,
    pub project: Project,
}

impl Fixture {
    pub fn project_id(&self) -> &ProjectId {
        &self.project.id
    }

    /// Order indices of the project's chapters, in listing order
    pub fn order_indices(&self) -> Vec<u32> {
        self.api
            .list_chapters(&self.owner, &self.project.id)
            .unwrap()
            .items
            .iter()
            .map(|c| c.order_index)
            .collect()
    }

    /// Assert the chapters are numbered exactly 1..=N
    pub fn assert_dense(&self) {
        let indices = self.order_indices();
        let expected: Vec<u32> = (1..=indices.len() as u32).collect();
        assert_eq!(indices, expected, "order indices are not dense");
    }
}

fn with_store(store: SqliteStore) -> Fixture {
    let api = ManuscriptApi::with_store(Arc::new(store));
    let owner = UserId::from("author");
    let project = api.register_project(&owner, "Test Manuscript").unwrap();
    Fixture { api, owner, project }
}

/// Fixture over an in-memory store
pub fn fixture() -> Fixture {
    with_store(SqliteStore::open_in_memory().unwrap())
}

/// Fixture over a database file at `path`
pub fn file_fixture(path: &Path) -> Fixture {
    with_store(SqliteStore::open(path).unwrap())
}
