//! In-memory implementations of the repository ports.
//!
//! Only compiled for tests and with the `test-utils` feature.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use coursemart_core::{DeliveryError, UserRole};
use coursemart_models::{
    ContentBlock, ContentBlockId, CourseId, ModuleId, OrderStatus, UpdateContentBlockDto, UserId,
};

use crate::ports::{
    BlockLocation, ContentRepository, CourseRef, EntitlementLookup, Identity, IdentityDirectory,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct InMemoryIdentities {
    users: RwLock<HashMap<UserId, Identity>>,
}

impl InMemoryIdentities {
    /// Register a fresh identity and return it.
    pub fn add(&self, role: UserRole, active: bool) -> Identity {
        let identity = Identity {
            user_id: UserId::new(),
            role,
            active,
        };
        self.insert(identity);
        identity
    }

    pub fn insert(&self, identity: Identity) {
        write(&self.users).insert(identity.user_id, identity);
    }

    pub fn set_active(&self, user_id: UserId, active: bool) {
        if let Some(identity) = write(&self.users).get_mut(&user_id) {
            identity.active = active;
        }
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentities {
    async fn find_identity(&self, user_id: UserId) -> Result<Option<Identity>, DeliveryError> {
        Ok(read(&self.users).get(&user_id).copied())
    }
}

/// Order rows reduced to what the gate looks at.
#[derive(Debug, Default)]
pub struct InMemoryEntitlements {
    orders: RwLock<Vec<(UserId, CourseId, OrderStatus)>>,
}

impl InMemoryEntitlements {
    pub fn record(&self, user_id: UserId, course_id: CourseId, status: OrderStatus) {
        write(&self.orders).push((user_id, course_id, status));
    }

    /// Move every order of the pair to `status`.
    pub fn set_status(&self, user_id: UserId, course_id: CourseId, status: OrderStatus) {
        for order in write(&self.orders).iter_mut() {
            if order.0 == user_id && order.1 == course_id {
                order.2 = status;
            }
        }
    }
}

#[async_trait]
impl EntitlementLookup for InMemoryEntitlements {
    async fn has_paid_entitlement(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, DeliveryError> {
        Ok(read(&self.orders)
            .iter()
            .any(|(u, c, status)| *u == user_id && *c == course_id && status.grants_access()))
    }
}

#[derive(Debug, Default)]
struct Catalog {
    courses: HashMap<CourseId, CourseRef>,
    modules: HashMap<ModuleId, (CourseId, i32)>,
    blocks: HashMap<ContentBlockId, ContentBlock>,
}

#[derive(Debug, Default)]
pub struct InMemoryContent {
    catalog: RwLock<Catalog>,
}

impl InMemoryContent {
    pub fn add_course(&self, owner_id: UserId) -> CourseRef {
        let course = CourseRef {
            id: CourseId::new(),
            owner_id,
        };
        write(&self.catalog).courses.insert(course.id, course);
        course
    }

    pub fn add_module(&self, course_id: CourseId, position: i32) -> ModuleId {
        let id = ModuleId::new();
        write(&self.catalog)
            .modules
            .insert(id, (course_id, position));
        id
    }

    pub fn add_block(
        &self,
        module_id: ModuleId,
        block_type: &str,
        locator: Option<&str>,
        position: i32,
    ) -> ContentBlock {
        let timestamp = Utc::now();
        let block = ContentBlock {
            id: ContentBlockId::new(),
            module_id,
            title: format!("Block {position}"),
            block_type: block_type.to_string(),
            content_url: locator.map(str::to_string),
            duration_seconds: None,
            position,
            created_at: timestamp,
            updated_at: timestamp,
        };
        write(&self.catalog).blocks.insert(block.id, block.clone());
        block
    }

    pub fn block(&self, block_id: ContentBlockId) -> Option<ContentBlock> {
        read(&self.catalog).blocks.get(&block_id).cloned()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContent {
    async fn find_course(&self, course_id: CourseId) -> Result<Option<CourseRef>, DeliveryError> {
        Ok(read(&self.catalog).courses.get(&course_id).copied())
    }

    async fn find_block(
        &self,
        block_id: ContentBlockId,
    ) -> Result<Option<BlockLocation>, DeliveryError> {
        let catalog = read(&self.catalog);
        let location = catalog.blocks.get(&block_id).and_then(|block| {
            let (course_id, _) = catalog.modules.get(&block.module_id)?;
            let course = catalog.courses.get(course_id)?;
            Some(BlockLocation {
                block_id: block.id,
                course_id: course.id,
                owner_id: course.owner_id,
                locator: block.content_url.clone(),
                media_type: block.block_type.clone(),
            })
        });
        Ok(location)
    }

    async fn list_blocks(&self, course_id: CourseId) -> Result<Vec<ContentBlock>, DeliveryError> {
        let catalog = read(&self.catalog);
        let mut blocks: Vec<(i32, ContentBlock)> = catalog
            .blocks
            .values()
            .filter_map(|block| {
                let (owner_course, module_position) = catalog.modules.get(&block.module_id)?;
                (*owner_course == course_id).then(|| (*module_position, block.clone()))
            })
            .collect();
        blocks.sort_by_key(|(module_position, block)| (*module_position, block.position));
        Ok(blocks.into_iter().map(|(_, block)| block).collect())
    }

    async fn set_block_locator(
        &self,
        block_id: ContentBlockId,
        locator: &str,
    ) -> Result<Option<ContentBlock>, DeliveryError> {
        let mut catalog = write(&self.catalog);
        Ok(catalog.blocks.get_mut(&block_id).map(|block| {
            block.content_url = Some(locator.to_string());
            block.updated_at = Utc::now();
            block.clone()
        }))
    }

    async fn update_block(
        &self,
        block_id: ContentBlockId,
        changes: &UpdateContentBlockDto,
    ) -> Result<Option<ContentBlock>, DeliveryError> {
        let mut catalog = write(&self.catalog);
        Ok(catalog.blocks.get_mut(&block_id).map(|block| {
            if let Some(title) = &changes.title {
                block.title = title.clone();
            }
            if let Some(block_type) = &changes.block_type {
                block.block_type = block_type.clone();
            }
            if let Some(position) = changes.position {
                block.position = position;
            }
            if let Some(duration) = changes.duration_seconds {
                block.duration_seconds = Some(duration);
            }
            block.updated_at = Utc::now();
            block.clone()
        }))
    }

    async fn delete_block(&self, block_id: ContentBlockId) -> Result<bool, DeliveryError> {
        Ok(write(&self.catalog).blocks.remove(&block_id).is_some())
    }
}
