//! The four resources of the bootcamp directory and how their listings are shaped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::QueryError;
use crate::query::PopulateSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Bootcamps,
    Courses,
    Reviews,
    Users,
}

const BOOTCAMP_FIELDS: &[&str] = &[
    "_id",
    "name",
    "slug",
    "description",
    "website",
    "phone",
    "email",
    "address",
    "location",
    "careers",
    "averageRating",
    "averageCost",
    "photo",
    "housing",
    "jobAssistance",
    "jobGuarantee",
    "acceptGi",
    "createdAt",
    "user",
    "courses",
];

const COURSE_FIELDS: &[&str] = &[
    "_id",
    "title",
    "description",
    "weeks",
    "tuition",
    "minimumSkill",
    "scholarshipAvailable",
    "createdAt",
    "bootcamp",
    "user",
];

const REVIEW_FIELDS: &[&str] =
    &["_id", "title", "text", "rating", "createdAt", "bootcamp", "user"];

const USER_FIELDS: &[&str] = &[
    "_id",
    "name",
    "email",
    "role",
    "password",
    "resetPasswordToken",
    "resetPasswordExpiration",
    "createdAt",
];

const USER_HIDDEN: &[&str] = &["password", "resetPasswordToken", "resetPasswordExpiration"];

impl Resource {
    pub const ALL: [Self; 4] = [Self::Bootcamps, Self::Courses, Self::Reviews, Self::Users];

    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Bootcamps => "bootcamps",
            Self::Courses => "courses",
            Self::Reviews => "reviews",
            Self::Users => "users",
        }
    }

    /// Top-level fields a document of this resource may carry.
    #[must_use]
    pub const fn known_fields(self) -> &'static [&'static str] {
        match self {
            Self::Bootcamps => BOOTCAMP_FIELDS,
            Self::Courses => COURSE_FIELDS,
            Self::Reviews => REVIEW_FIELDS,
            Self::Users => USER_FIELDS,
        }
    }

    /// Fields never returned in listings, even when selected explicitly.
    #[must_use]
    pub const fn hidden_fields(self) -> &'static [&'static str] {
        match self {
            Self::Users => USER_HIDDEN,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn default_limit(self) -> u64 {
        match self {
            Self::Bootcamps => 25,
            Self::Courses | Self::Reviews | Self::Users => 100,
        }
    }

    #[must_use]
    pub fn default_populate(self) -> Vec<PopulateSpec> {
        match self {
            Self::Bootcamps => vec![PopulateSpec::virtual_field(
                "courses",
                Self::Courses.collection(),
                "bootcamp",
            )],
            Self::Courses | Self::Reviews => vec![
                PopulateSpec::reference("bootcamp", Self::Bootcamps.collection())
                    .with_select(["name", "description"]),
            ],
            Self::Users => Vec::new(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for Resource {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.collection().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::InvalidData(format!("unknown resource: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Relation;

    #[test]
    fn names_round_trip() {
        for r in Resource::ALL {
            assert_eq!(r.collection().parse::<Resource>().unwrap(), r);
        }
        assert_eq!("Bootcamps".parse::<Resource>().unwrap(), Resource::Bootcamps);
        assert!("camps".parse::<Resource>().is_err());
    }

    #[test]
    fn default_limits_per_call_site() {
        assert_eq!(Resource::Bootcamps.default_limit(), 25);
        assert_eq!(Resource::Courses.default_limit(), 100);
    }

    #[test]
    fn populate_relations() {
        let camps = Resource::Bootcamps.default_populate();
        assert!(matches!(
            &camps[0].relation,
            Relation::Virtual { collection, foreign_field }
                if collection == "courses" && foreign_field == "bootcamp"
        ));
        let courses = Resource::Courses.default_populate();
        assert_eq!(courses[0].path, "bootcamp");
        assert_eq!(courses[0].select.as_deref(), Some(&["name".to_string(), "description".to_string()][..]));
        assert!(Resource::Users.default_populate().is_empty());
    }

    #[test]
    fn hidden_fields_are_known() {
        for r in Resource::ALL {
            for h in r.hidden_fields() {
                assert!(r.known_fields().contains(h));
            }
        }
    }
}
