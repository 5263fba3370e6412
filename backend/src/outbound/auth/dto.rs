//! Wire representation of Auth service payloads.

use serde::Deserialize;

use crate::domain::AuthUser;

/// User payload as the Auth service serialises it.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct AuthUserDto {
    pub id: i32,
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<AuthUserDto> for AuthUser {
    fn from(dto: AuthUserDto) -> Self {
        Self {
            id: dto.id,
            name: dto.nome,
            email: dto.email,
            is_admin: dto.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_auth_payload() {
        let dto: AuthUserDto =
            serde_json::from_str(r#"{"id":1,"nome":"Alice Silva","email":"alice@example.com"}"#)
                .expect("valid payload");
        let user = AuthUser::from(dto);
        assert_eq!(user.id, 1);
        assert!(!user.is_admin);
    }
}
