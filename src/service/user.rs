//! User provisioning and direct permission grants

use crate::cache::CacheManager;
use crate::domain::{is_valid_permission_name, CreateUserInput, StringUuid, UpdateUserInput, User};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    cache: Option<CacheManager>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>, cache: Option<CacheManager>) -> Self {
        Self { repo, cache }
    }

    /// Create a principal bound to a tenant. The binding is final; no
    /// update path exists that could move the user to another tenant.
    pub async fn create_in_tenant(
        &self,
        tenant_id: StringUuid,
        input: CreateUserInput,
    ) -> Result<User> {
        self.create(Some(tenant_id), input).await
    }

    /// Create a platform operator: a principal with no tenant binding.
    pub async fn create_platform_operator(&self, input: CreateUserInput) -> Result<User> {
        self.create(None, input).await
    }

    async fn create(&self, tenant_id: Option<StringUuid>, input: CreateUserInput) -> Result<User> {
        input.validate()?;

        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        let user = User {
            tenant_id,
            email: input.email,
            name: input.name,
            role: input.role,
            ..Default::default()
        };
        self.repo.create(&user).await?;

        info!(user = %user.id, tenant = ?user.tenant_id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: StringUuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn update(&self, id: StringUuid, input: UpdateUserInput) -> Result<User> {
        input.validate()?;
        let _ = self.get(id).await?;
        self.repo.update(id, &input).await
    }

    /// Revoke access while preserving audit history.
    pub async fn deactivate(&self, id: StringUuid) -> Result<()> {
        let user = self.get(id).await?;
        self.repo.set_active(user.id, false).await?;
        self.invalidate(user.id).await;
        info!(user = %user.id, "user deactivated");
        Ok(())
    }

    pub async fn reactivate(&self, id: StringUuid) -> Result<()> {
        let user = self.get(id).await?;
        self.repo.set_active(user.id, true).await?;
        self.invalidate(user.id).await;
        Ok(())
    }

    /// Grant a direct permission, independent of the role bundle.
    pub async fn grant_permission(&self, id: StringUuid, permission: &str) -> Result<User> {
        if !is_valid_permission_name(permission) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid permission name",
                permission
            )));
        }

        let mut user = self.get(id).await?;
        if !user.permissions.iter().any(|p| p == permission) {
            user.permissions.push(permission.to_string());
            self.repo.set_permissions(user.id, &user.permissions).await?;
            self.invalidate(user.id).await;
        }
        Ok(user)
    }

    /// The principal's effective ability set: role bundle ∪ direct grants,
    /// sorted and deduplicated. Served from cache when warm. Admin is
    /// deliberately absent here; the authorization engine short-circuits
    /// it before any permission lookup.
    pub async fn effective_permissions(&self, id: StringUuid) -> Result<Vec<String>> {
        if let Some(cache) = &self.cache {
            if let Ok(Some(permissions)) = cache.get_user_permissions(*id).await {
                return Ok(permissions);
            }
        }

        let user = self.get(id).await?;
        let mut permissions: BTreeSet<String> = user
            .role
            .default_permissions()
            .iter()
            .map(|p| p.to_string())
            .collect();
        permissions.extend(user.permissions.iter().cloned());
        let permissions: Vec<String> = permissions.into_iter().collect();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_user_permissions(*id, &permissions).await {
                warn!(user = %id, "failed to cache permission set: {e}");
            }
        }
        Ok(permissions)
    }

    pub async fn revoke_permission(&self, id: StringUuid, permission: &str) -> Result<User> {
        let mut user = self.get(id).await?;
        let before = user.permissions.len();
        user.permissions.retain(|p| p != permission);
        if user.permissions.len() != before {
            self.repo.set_permissions(user.id, &user.permissions).await?;
            self.invalidate(user.id).await;
        }
        Ok(user)
    }

    async fn invalidate(&self, user_id: StringUuid) {
        if let Some(cache) = &self.cache {
            // Left stale, the old set would keep answering for a full TTL.
            if let Err(e) = cache.invalidate_user_permissions(*user_id).await {
                warn!(user = %user_id, "failed to invalidate cached permission set: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::repository::MockUserRepository;
    use mockall::predicate::*;

    fn create_input() -> CreateUserInput {
        CreateUserInput {
            email: "ana@brightsmiles.test".to_string(),
            name: "Ana Reyes".to_string(),
            role: Role::Receptionist,
        }
    }

    #[tokio::test]
    async fn test_create_in_tenant_binds_tenant() {
        let tenant_id = StringUuid::new_v4();
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_email().returning(|_| Ok(None));
        mock.expect_create()
            .withf(move |user| user.tenant_id == Some(tenant_id) && user.role == Role::Receptionist)
            .returning(|_| Ok(()));

        let service = UserService::new(Arc::new(mock), None);
        let user = service
            .create_in_tenant(tenant_id, create_input())
            .await
            .unwrap();
        assert!(!user.is_platform_operator());
    }

    #[tokio::test]
    async fn test_create_platform_operator_has_no_binding() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_email().returning(|_| Ok(None));
        mock.expect_create()
            .withf(|user| user.tenant_id.is_none())
            .returning(|_| Ok(()));

        let service = UserService::new(Arc::new(mock), None);
        let user = service.create_platform_operator(create_input()).await.unwrap();
        assert!(user.is_platform_operator());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_email()
            .returning(|_| Ok(Some(User::default())));
        mock.expect_create().never();

        let service = UserService::new(Arc::new(mock), None);
        let result = service
            .create_in_tenant(StringUuid::new_v4(), create_input())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_grant_permission_validates_convention() {
        let mock = MockUserRepository::new();
        let service = UserService::new(Arc::new(mock), None);

        let result = service
            .grant_permission(StringUuid::new_v4(), "DoAnything")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_grant_permission_is_idempotent() {
        let user = User {
            permissions: vec!["create_patients".to_string()],
            ..Default::default()
        };
        let id = user.id;

        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));
        // Already granted: no write.
        mock.expect_set_permissions().never();

        let service = UserService::new(Arc::new(mock), None);
        let user = service.grant_permission(id, "create_patients").await.unwrap();
        assert_eq!(user.permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_effective_permissions_union_role_and_grants() {
        let user = User {
            role: Role::Assistant,
            // Direct grant overlapping the bundle plus one extra.
            permissions: vec!["view_patients".to_string(), "restore_patients".to_string()],
            ..Default::default()
        };
        let id = user.id;

        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(mock), None);
        let permissions = service.effective_permissions(id).await.unwrap();
        assert_eq!(
            permissions,
            vec!["restore_patients", "view_appointments", "view_patients"]
        );
    }

    #[tokio::test]
    async fn test_deactivate_flips_flag() {
        let user = User::default();
        let id = user.id;

        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));
        mock.expect_set_active()
            .with(eq(id), eq(false))
            .returning(|_, _| Ok(()));

        let service = UserService::new(Arc::new(mock), None);
        service.deactivate(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_permission_removes_grant() {
        let user = User {
            permissions: vec!["create_patients".to_string(), "view_reports".to_string()],
            ..Default::default()
        };
        let id = user.id;

        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));
        mock.expect_set_permissions()
            .withf(|_, permissions| permissions.iter().map(String::as_str).eq(["view_reports"]))
            .returning(|_, _| Ok(()));

        let service = UserService::new(Arc::new(mock), None);
        let user = service.revoke_permission(id, "create_patients").await.unwrap();
        assert_eq!(user.permissions, vec!["view_reports"]);
    }
}
