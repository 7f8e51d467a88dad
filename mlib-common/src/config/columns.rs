//! Trusted registry of report column specifications.
//!
//! Users choose an ordered subset of column *names* when requesting a
//! report; everything else about a column — the materialization strategy,
//! the tables and keys it touches, its spreadsheet width — comes from this
//! closed registry. The report engine matches on [`ColumnStrategy`] rather
//! than assembling SQL from request data.

/// Join path for a many-valued column that goes through a link table.
#[derive(Debug, Clone, Copy)]
pub struct MultipleJoin {
    /// Link table (has a `LibraryItem` column).
    pub table: &'static str,
    /// Link-table column pointing at the value table.
    pub join_column: &'static str,
    /// Value-table key the link column points at.
    pub value_key: &'static str,
}

/// How one report column is materialized for the surviving item set.
#[derive(Debug, Clone, Copy)]
pub enum ColumnStrategy {
    /// Synthesized key string per item id, from a zero-padding template.
    Key { format: &'static str },
    /// Single column fetched from LibraryItem itself.
    Direct { column: &'static str, format: Option<&'static str> },
    /// Person reference rendered as "Last, First (dates)".
    Person { join_column: &'static str },
    /// Distinct related values joined with "; ", ascending.
    Multiple {
        value_table: &'static str,
        value_column: &'static str,
        join: Option<MultipleJoin>,
        /// Optional trusted WHERE fragment applied to the value table.
        condition: Option<&'static str>,
    },
    /// Display column in a referenced table, via LEFT JOIN on an item FK.
    Lookup {
        value_table: &'static str,
        value_key: &'static str,
        value_column: &'static str,
        join_column: &'static str,
    },
    /// Value from the most-recently-dated inventory row for the item.
    Inventory { value_column: &'static str },
    /// MAX(PerformanceDate) across the item's performance records.
    LastPerformance,
}

/// One report column: display name, spreadsheet width, strategy.
#[derive(Debug, Clone, Copy)]
pub struct ReportColumn {
    pub name: &'static str,
    pub width: f64,
    pub strategy: ColumnStrategy,
}

/// All columns offerable on the report form, in display order.
pub const REPORT_COLUMNS: &[ReportColumn] = &[
    ReportColumn {
        name: "Item ID",
        width: 10.0,
        strategy: ColumnStrategy::Key { format: "%06d" },
    },
    ReportColumn {
        name: "Title",
        width: 40.0,
        strategy: ColumnStrategy::Direct { column: "ItemTitle", format: None },
    },
    ReportColumn {
        name: "Other Title",
        width: 30.0,
        strategy: ColumnStrategy::Direct { column: "OtherTitle", format: None },
    },
    ReportColumn {
        name: "Is Collection",
        width: 12.0,
        strategy: ColumnStrategy::Direct { column: "IsCollection", format: None },
    },
    ReportColumn {
        name: "Collection",
        width: 30.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryItem",
            value_key: "ItemID",
            value_column: "ItemTitle",
            join_column: "CollectionID",
        },
    },
    ReportColumn {
        name: "Composer",
        width: 30.0,
        strategy: ColumnStrategy::Person { join_column: "ComposerID" },
    },
    ReportColumn {
        name: "Lyricist",
        width: 30.0,
        strategy: ColumnStrategy::Person { join_column: "LyricistID" },
    },
    ReportColumn {
        name: "Arranger",
        width: 30.0,
        strategy: ColumnStrategy::Person { join_column: "ArrangerID" },
    },
    ReportColumn {
        name: "Arrangement",
        width: 20.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryArrangement",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "ArrangementID",
        },
    },
    ReportColumn {
        name: "Key",
        width: 12.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryKey",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "KeyID",
        },
    },
    ReportColumn {
        name: "Skill",
        width: 14.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibrarySkill",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "SkillID",
        },
    },
    ReportColumn {
        name: "Accompaniment",
        width: 20.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryAccompaniment",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "AccompanimentID",
        },
    },
    ReportColumn {
        name: "Handbell Ensemble",
        width: 20.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryHandbellEnsemble",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "HandbellEnsembleID",
        },
    },
    ReportColumn {
        name: "Season",
        width: 16.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibrarySeason",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "SeasonID",
        },
    },
    ReportColumn {
        name: "Owner",
        width: 16.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryOwner",
            value_key: "LookupID",
            value_column: "LookupValue",
            join_column: "OwnerID",
        },
    },
    ReportColumn {
        name: "Publisher",
        width: 24.0,
        strategy: ColumnStrategy::Lookup {
            value_table: "LibraryCompany",
            value_key: "CompanyID",
            value_column: "CompanyName",
            join_column: "PublisherID",
        },
    },
    ReportColumn {
        name: "Keywords",
        width: 30.0,
        strategy: ColumnStrategy::Multiple {
            value_table: "LibraryKeyword",
            value_column: "LookupValue",
            join: Some(MultipleJoin {
                table: "LibraryItemKeyword",
                join_column: "LibraryKeyword",
                value_key: "LookupID",
            }),
            condition: None,
        },
    },
    ReportColumn {
        name: "Tags",
        width: 30.0,
        strategy: ColumnStrategy::Multiple {
            value_table: "LibraryTag",
            value_column: "TagName",
            join: Some(MultipleJoin {
                table: "LibraryItemTag",
                join_column: "LibraryTag",
                value_key: "TagID",
            }),
            condition: None,
        },
    },
    ReportColumn {
        name: "Parts",
        width: 30.0,
        strategy: ColumnStrategy::Multiple {
            value_table: "LibraryPart",
            value_column: "PartName",
            join: None,
            condition: None,
        },
    },
    ReportColumn {
        name: "Missing Parts",
        width: 30.0,
        strategy: ColumnStrategy::Multiple {
            value_table: "LibraryPart",
            value_column: "PartName",
            join: None,
            condition: Some("WHERE v.OnHand < v.Needed"),
        },
    },
    ReportColumn {
        name: "Copies On Hand",
        width: 14.0,
        strategy: ColumnStrategy::Inventory { value_column: "InStock" },
    },
    ReportColumn {
        name: "Latest Price",
        width: 12.0,
        strategy: ColumnStrategy::Inventory { value_column: "LatestPrice" },
    },
    ReportColumn {
        name: "Last Performance",
        width: 16.0,
        strategy: ColumnStrategy::LastPerformance,
    },
    ReportColumn {
        name: "Duration",
        width: 10.0,
        strategy: ColumnStrategy::Direct { column: "Duration", format: None },
    },
    ReportColumn {
        name: "Copyright",
        width: 16.0,
        strategy: ColumnStrategy::Direct { column: "Copyright", format: None },
    },
    ReportColumn {
        name: "Date Added",
        width: 14.0,
        strategy: ColumnStrategy::Direct { column: "DateAdded", format: None },
    },
    ReportColumn {
        name: "Added By",
        width: 14.0,
        strategy: ColumnStrategy::Direct { column: "AddedBy", format: None },
    },
    ReportColumn {
        name: "Comments",
        width: 40.0,
        strategy: ColumnStrategy::Direct { column: "Comments", format: None },
    },
];

/// Look up a column spec by display name.
pub fn report_column(name: &str) -> Option<&'static ReportColumn> {
    REPORT_COLUMNS.iter().find(|col| col.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_unique() {
        let mut names: Vec<_> = REPORT_COLUMNS.iter().map(|col| col.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), REPORT_COLUMNS.len());
    }

    #[test]
    fn item_id_column_is_the_key_strategy() {
        let col = report_column("Item ID").unwrap();
        assert!(matches!(col.strategy, ColumnStrategy::Key { format: "%06d" }));
    }
}
