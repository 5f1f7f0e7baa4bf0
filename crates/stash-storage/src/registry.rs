//! Static database and table descriptors
//!
//! Applications describe their databases and tables as enums implementing
//! `LogicalDatabase` / `LogicalTable`. Descriptors resolve through the same
//! `PathResolver` as the manager, so both address the same files.

use std::path::PathBuf;

use crate::database::Database;
use crate::path::PathResolver;
use crate::query::QueryOptions;
use crate::Result;

/// Base of the conventional tag numbering.
pub const TAG_BASE: i64 = 2020;

pub trait LogicalDatabase {
    fn name(&self) -> &'static str;

    /// Opaque identifier stamped on every handle opened for this database.
    fn tag(&self) -> i64;

    fn path(&self, resolver: &PathResolver) -> PathBuf {
        resolver.path(self.name())
    }

    /// A fresh, tagged handle. Nothing is cached.
    fn open(&self, resolver: &PathResolver) -> Result<Database> {
        let path = resolver.ensure_parent(self.name())?;
        Ok(Database::open(path)?.with_tag(self.tag()))
    }
}

pub trait LogicalTable {
    type Database: LogicalDatabase;

    fn name(&self) -> &'static str;

    fn database(&self) -> Self::Database;

    /// Query prepared ahead of time for this table. None of the shipped
    /// descriptors prepare one.
    fn prepared_select(&self) -> Option<QueryOptions> {
        None
    }

    /// The prepared query, or an unfiltered one.
    fn query(&self) -> QueryOptions {
        self.prepared_select().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDatabase {
    Study,
    CourseList,
    CourseDetail,
}

impl LogicalDatabase for SampleDatabase {
    fn name(&self) -> &'static str {
        match self {
            SampleDatabase::Study => "Study",
            SampleDatabase::CourseList => "CourseList",
            SampleDatabase::CourseDetail => "CourseDetail",
        }
    }

    fn tag(&self) -> i64 {
        match self {
            SampleDatabase::Study => TAG_BASE + 1,
            SampleDatabase::CourseList => TAG_BASE + 2,
            SampleDatabase::CourseDetail => TAG_BASE + 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleTable {
    Study,
    CourseList,
    CourseDetail,
}

impl LogicalTable for SampleTable {
    type Database = SampleDatabase;

    fn name(&self) -> &'static str {
        match self {
            SampleTable::Study => "Study",
            SampleTable::CourseList => "CourseList",
            SampleTable::CourseDetail => "CourseDetail",
        }
    }

    fn database(&self) -> SampleDatabase {
        match self {
            SampleTable::Study => SampleDatabase::Study,
            SampleTable::CourseList => SampleDatabase::CourseList,
            SampleTable::CourseDetail => SampleDatabase::CourseDetail,
        }
    }
}
