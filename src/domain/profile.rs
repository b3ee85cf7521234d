use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{parse_amount, Plan, PushSubscription, ValidationError};

/// Avatar used when a member has no uploaded photo, seeded by name
pub const DEFAULT_AVATAR_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("ADMIN"),
            Role::Member => f.write_str("MEMBER"),
        }
    }
}

/// Profile attached to an identity
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    /// Same identifier as the identity collaborator's account
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub age: u32,
    /// Kilograms
    pub weight: f64,
    /// Centimetres
    pub height: f64,
    pub address: Option<String>,
    pub body_goal: Option<String>,
    pub photo: String,
    /// Set once the member enables push notifications
    pub subscription: Option<PushSubscription>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Self-service signup form, as submitted
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub age: String,
    pub weight: String,
    pub height: String,
    pub address: Option<String>,
    pub body_goal: Option<String>,
}

/// Validated signup
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub address: Option<String>,
    pub body_goal: Option<String>,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let password = self.password;
        if password.chars().count() < 6 {
            return Err(ValidationError::new(
                "password",
                "must be at least 6 characters",
            ));
        }

        Ok(Registration {
            name: text("name", &self.name, 2)?,
            email: email(&self.email)?,
            password,
            phone: text("phone", &self.phone, 10)?,
            age: number("age", &self.age, 10)?,
            weight: number("weight", &self.weight, 20.0)?,
            height: number("height", &self.height, 50.0)?,
            address: optional(self.address),
            body_goal: optional(self.body_goal),
        })
    }
}

impl Registration {
    pub fn into_profile(self, id: Uuid, created_at: DateTime<Utc>) -> Profile {
        Profile {
            id,
            photo: default_avatar(&self.name),
            email: self.email,
            name: self.name,
            phone: self.phone,
            age: self.age,
            weight: self.weight,
            height: self.height,
            address: self.address,
            body_goal: self.body_goal,
            subscription: None,
            role: Role::Member,
            created_at,
        }
    }
}

/// Member entered by an admin, possibly from a historical paper record
#[derive(Clone, Debug, Default)]
pub struct NewMemberForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub weight: String,
    pub height: String,
    pub address: Option<String>,
    pub plan: String,
    /// `YYYY-MM-DD`, defaults to now
    pub join_date: Option<String>,
    /// Amount actually paid, defaults to the plan price
    pub amount: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub address: Option<String>,
    pub plan: Plan,
    pub join_date: Option<NaiveDate>,
    pub amount: Option<f64>,
}

impl NewMemberForm {
    pub fn validate(self) -> Result<NewMember, ValidationError> {
        let join_date = match self.join_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::new("join_date", format!("'{raw}' is not a YYYY-MM-DD date"))
            })?),
        };

        Ok(NewMember {
            name: text("name", &self.name, 2)?,
            email: email(&self.email)?,
            phone: text("phone", &self.phone, 10)?,
            age: number("age", &self.age, 10)?,
            weight: number("weight", &self.weight, 20.0)?,
            height: number("height", &self.height, 50.0)?,
            address: optional(self.address),
            plan: self.plan.parse()?,
            join_date,
            amount: parse_amount("amount", self.amount.as_deref())?,
        })
    }
}

impl NewMember {
    pub fn profile(&self, id: Uuid, created_at: DateTime<Utc>) -> Profile {
        Profile {
            id,
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            age: self.age,
            weight: self.weight,
            height: self.height,
            address: self.address.clone(),
            body_goal: None,
            photo: default_avatar(&self.name),
            subscription: None,
            role: Role::Member,
            created_at,
        }
    }

    /// Start of the membership: midnight UTC on the join date, or `now`
    pub fn start_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.join_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|start| start.and_utc())
            .unwrap_or(now)
    }
}

fn default_avatar(name: &str) -> String {
    format!("{DEFAULT_AVATAR_URL}{}", name.replace(' ', "%20"))
}

fn text(field: &'static str, value: &str, min_chars: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.chars().count() < min_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at least {min_chars} characters"),
        ));
    }
    Ok(value.to_string())
}

fn email(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    Ok(value.to_string())
}

fn number<T>(field: &'static str, raw: &str, min: T) -> Result<T, ValidationError>
where
    T: FromStr + PartialOrd + fmt::Display,
{
    let raw = raw.trim();
    let value: T = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{raw}' is not a number")))?;
    if !(value >= min) {
        return Err(ValidationError::new(field, format!("must be at least {min}")));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
