//! In-memory store - used when no database is configured, and in tests.
//!
//! The three repositories share one set of tables so that deleting a user or a
//! group can propagate to posts the same way the foreign keys do in PostgreSQL.
//! Note: data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogpad_core::domain::{Group, OnDelete, Post, PostEntry, PostFilter, User};
use blogpad_core::error::RepoError;
use blogpad_core::ports::{BaseRepository, GroupRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    /// Posts with their insertion sequence, used to order posts published in the same instant.
    posts: HashMap<Uuid, (u64, Post)>,
    next_seq: u64,
}

impl Tables {
    fn entry(&self, post: &Post) -> Result<PostEntry, RepoError> {
        let author = self
            .users
            .get(&post.author_id)
            .cloned()
            .ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;
        let group = post.group_id.and_then(|id| self.groups.get(&id).cloned());

        Ok(PostEntry {
            post: post.clone(),
            author,
            group,
        })
    }

    fn check_references(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("Author does not exist".to_string()));
        }
        let missing_group = post
            .group_id
            .is_some_and(|id| !self.groups.contains_key(&id));
        if missing_group {
            return Err(RepoError::Constraint("Group does not exist".to_string()));
        }
        Ok(())
    }

    /// Apply a deletion rule to every post matching `filter`.
    fn propagate_delete(&mut self, filter: PostFilter, rule: OnDelete) {
        match rule {
            OnDelete::Cascade => self.posts.retain(|_, (_, post)| !filter.matches(post)),
            OnDelete::SetNull => {
                for (_, post) in self.posts.values_mut() {
                    if filter.matches(post) {
                        post.group_id = None;
                    }
                }
            }
        }
    }
}

/// Shared in-memory tables. Hand out repositories with [`users`](Self::users),
/// [`groups`](Self::groups) and [`posts`](Self::posts).
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn groups(&self) -> InMemoryGroupRepository {
        InMemoryGroupRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }
}

pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryGroupRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.username == user.username)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        let slot = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;
        tables.propagate_delete(PostFilter::Author(id), Post::AUTHOR_ON_DELETE);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.contains_key(&group.id)
            || tables.groups.values().any(|g| g.slug == group.slug)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .values()
            .any(|g| g.id != group.id && g.slug == group.slug)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        let slot = tables.groups.get_mut(&group.id).ok_or(RepoError::NotFound)?;
        *slot = group.clone();
        Ok(group)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.groups.remove(&id).ok_or(RepoError::NotFound)?;
        tables.propagate_delete(PostFilter::Group(id), Post::GROUP_ON_DELETE);
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|(_, post)| post.clone()))
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.check_references(&post)?;

        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.posts.insert(post.id, (seq, post.clone()));
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_references(&post)?;
        let (_, slot) = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .values()
            .filter(|(_, post)| filter.matches(post))
            .count();
        Ok(count as u64)
    }

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&(u64, Post)> = tables
            .posts
            .values()
            .filter(|(_, post)| filter.matches(post))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.pub_date.cmp(&a.pub_date).then(seq_b.cmp(seq_a))
        });

        matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, post)| tables.entry(post))
            .collect()
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|(_, post)| tables.entry(post))
            .transpose()
    }
}
