//! Test domain: students and their marks.

use managed_store::Model;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Model for Student {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(self, id: String) -> Self {
        Self { id, ..self }
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub fn student(id: &str, name: &str) -> Student {
    Student {
        id: id.into(),
        name: name.into(),
        surname: None,
        email: None,
    }
}

/// `[{id:"1",name:"A"},{id:"2",name:"B"}]`
pub fn two_students() -> Vec<Student> {
    vec![student("1", "A"), student("2", "B")]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: String,
    pub number: i64,
    pub id_user: String,
}

impl Model for Mark {
    const COLLECTION: &'static str = "marks";

    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(self, id: String) -> Self {
        Self { id, ..self }
    }
}

pub fn mark(id: &str, number: i64, id_user: &str) -> Mark {
    Mark {
        id: id.into(),
        number,
        id_user: id_user.into(),
    }
}
