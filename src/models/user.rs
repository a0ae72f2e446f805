use serde::{Deserialize, Serialize};

/// The slice of a user account the assignment strategies look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub company_id: i64,
    pub is_active: bool,
    pub roles: Vec<String>,
}

impl User {
    pub fn new(id: i64, company_id: i64, roles: &[&str]) -> Self {
        Self {
            id,
            company_id,
            is_active: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Active member of `company_id` holding `role`
    pub fn is_eligible(&self, role: &str, company_id: i64) -> bool {
        self.is_active && self.company_id == company_id && self.has_role(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_requires_role_company_and_activity() {
        let user = User::new(1, 10, &["maintenance_tech", "leasing_agent"]);
        assert!(user.is_eligible("maintenance_tech", 10));
        assert!(!user.is_eligible("maintenance_tech", 11));
        assert!(!user.is_eligible("accountant", 10));
        assert!(!user.inactive().is_eligible("maintenance_tech", 10));
    }
}
