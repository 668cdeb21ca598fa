use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coachmeet_db::models::{
    Area, Gender, Group, GroupWithCoach, Meet, MeetStatus, TraineeGroup, TraineeMeet, User,
};

// -- JWT Claims --

/// JWT claims shared by token issuance and the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    /// Session version at issue time; stale once the user logs out or
    /// changes their password.
    pub ver: i64,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub gender: Gender,
    #[serde(default)]
    pub is_coach: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
    pub areas: Vec<AreaResponse>,
}

/// A fresh token issued after the old session was invalidated.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub date_of_birth: Option<NaiveDate>,
    pub description: String,
    pub is_coach: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            description: user.description.clone(),
            is_coach: user.is_coach,
        }
    }
}

/// Reduced user shape used in member rosters.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserBaseResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
}

impl From<&User> for UserBaseResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub is_coach: bool,
    pub in_groups: Vec<GroupInfoResponse>,
    pub coach_groups: Vec<GroupResponse>,
}

// -- Areas --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAreaRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AreaResponse {
    pub area_id: Uuid,
    pub name: String,
}

impl From<&Area> for AreaResponse {
    fn from(area: &Area) -> Self {
        Self {
            area_id: area.id,
            name: area.name.clone(),
        }
    }
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub area_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GroupsQuery {
    pub area_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group_id: Uuid,
    pub coach_id: Uuid,
    pub coach_name: String,
    pub name: String,
    pub description: String,
    pub area_id: Uuid,
}

impl GroupResponse {
    pub fn new(group: &Group, coach_name: &str) -> Self {
        Self {
            group_id: group.id,
            coach_id: group.coach_id,
            coach_name: coach_name.to_string(),
            name: group.name.clone(),
            description: group.description.clone(),
            area_id: group.area_id,
        }
    }
}

impl From<&GroupWithCoach> for GroupResponse {
    fn from(row: &GroupWithCoach) -> Self {
        Self::new(&row.group, &row.coach_name)
    }
}

/// A group as seen from a member's profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupInfoResponse {
    pub group_id: Uuid,
    pub coach_name: String,
    pub name: String,
    pub area_name: String,
}

impl From<&TraineeGroup> for GroupInfoResponse {
    fn from(row: &TraineeGroup) -> Self {
        Self {
            group_id: row.group_id,
            coach_name: row.coach_name.clone(),
            name: row.group_name.clone(),
            area_name: row.area_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupViewResponse {
    pub group: GroupResponse,
    pub meets: Vec<MeetInfoResponse>,
}

// -- Meets --

/// Body for both scheduling and rescheduling a meet.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetRequest {
    pub max_members: u32,
    /// `YYYY-MM-DD HH:MM:SS`
    pub meet_date: String,
    pub duration: u32,
    pub city: String,
    pub street: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetResponse {
    pub meet_id: Uuid,
    pub group_id: Uuid,
    pub max_members: u32,
    pub meet_date: String,
    pub meet_time: String,
    pub duration: u32,
    pub city: String,
    pub street: String,
    pub members: Vec<UserBaseResponse>,
}

impl MeetResponse {
    pub fn new(meet: &Meet, members: &[User]) -> Self {
        Self {
            meet_id: meet.id,
            group_id: meet.group_id,
            max_members: meet.max_members,
            meet_date: meet.meet_date.format("%Y-%m-%d").to_string(),
            meet_time: meet.meet_date.format("%H:%M:%S").to_string(),
            duration: meet.duration,
            city: meet.city.clone(),
            street: meet.street.clone(),
            members: members.iter().map(UserBaseResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetInfoResponse {
    pub meet_id: Uuid,
    pub group_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub meet_date: String,
    pub meet_time: String,
    pub duration: u32,
    pub city: String,
    pub street: String,
    pub full: bool,
    pub registered: bool,
}

impl MeetInfoResponse {
    fn new(meet: &Meet, group_name: Option<&str>, full: bool, registered: bool) -> Self {
        Self {
            meet_id: meet.id,
            group_id: meet.group_id,
            group_name: group_name.map(str::to_string),
            meet_date: meet.meet_date.format("%Y-%m-%d").to_string(),
            meet_time: meet.meet_date.format("%H:%M:%S").to_string(),
            duration: meet.duration,
            city: meet.city.clone(),
            street: meet.street.clone(),
            full,
            registered,
        }
    }
}

impl From<&MeetStatus> for MeetInfoResponse {
    fn from(row: &MeetStatus) -> Self {
        Self::new(&row.meet, None, row.full, row.registered)
    }
}

impl From<&TraineeMeet> for MeetInfoResponse {
    fn from(row: &TraineeMeet) -> Self {
        Self::new(&row.meet, Some(&row.group_name), row.full, row.registered)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MyMeetsResponse {
    pub meets: Vec<MeetInfoResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachmeet_db::models::parse_meet_date;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Anna".into(),
            email: "anna@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            phone: "+100".into(),
            gender: Gender::Female,
            date_of_birth: None,
            description: String::new(),
            is_coach: false,
        }
    }

    #[test]
    fn user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse::from(&user())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["gender"], "female");
        assert_eq!(json["is_coach"], false);
    }

    #[test]
    fn meet_response_splits_date_and_time() {
        let meet = Meet {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            max_members: 4,
            meet_date: parse_meet_date("2025-06-01 18:30:00").unwrap(),
            duration: 60,
            city: "Oslo".into(),
            street: "Main 1".into(),
        };
        let members = vec![user()];

        let response = MeetResponse::new(&meet, &members);
        assert_eq!(response.meet_date, "2025-06-01");
        assert_eq!(response.meet_time, "18:30:00");
        assert_eq!(response.members.len(), 1);

        let info = MeetInfoResponse::from(&MeetStatus {
            meet,
            full: true,
            registered: false,
        });
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("group_name").is_none());
        assert_eq!(json["full"], true);
        assert_eq!(json["registered"], false);
    }

    #[test]
    fn signup_rejects_unknown_fields() {
        let body = r#"{"name":"A","email":"a@b.co","password":"pw","phone":"1","gender":"male","is_trainer":true}"#;
        assert!(serde_json::from_str::<SignupRequest>(body).is_err());

        let body = r#"{"name":"A","email":"a@b.co","password":"pw","phone":"1","gender":"male"}"#;
        let req: SignupRequest = serde_json::from_str(body).unwrap();
        assert!(!req.is_coach);
        assert_eq!(req.gender, Gender::Male);
    }
}
