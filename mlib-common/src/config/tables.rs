//! Trusted registry of the catalog schema.
//!
//! Maps API slugs to lookup tables, and describes the catalog item record:
//! its editable columns, its many-to-many link tables, and its repeating
//! subrecord tables. Handlers drive their SQL off these entries, so every
//! identifier that reaches query text comes from this file, never from the
//! request.

/// Where references to a lookup record are counted for the `used_by`
/// field on a fetched record.
#[derive(Debug, Clone, Copy)]
pub struct UsedBy {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// One lookup table exposed through the generic record API.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// URL slug (e.g. `"season"` for `/api/season`).
    pub slug: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Columns settable from the client, in insert order.
    pub columns: &'static [&'static str],
    /// Column whose value is echoed back as the record's display text.
    pub display: &'static str,
    pub used_by: Option<UsedBy>,
}

const SIMPLE_LOOKUP_COLUMNS: &[&str] = &["LookupValue", "SortPosition", "Comments"];

/// All lookup tables editable through `/api/{slug}`.
pub const TABLE_REGISTRY: &[TableSpec] = &[
    TableSpec {
        slug: "accompaniment",
        table: "LibraryAccompaniment",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["AccompanimentID"] }),
    },
    TableSpec {
        slug: "arrangement",
        table: "LibraryArrangement",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["ArrangementID"] }),
    },
    TableSpec {
        slug: "handbell-ensemble",
        table: "LibraryHandbellEnsemble",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["HandbellEnsembleID"] }),
    },
    TableSpec {
        slug: "key",
        table: "LibraryKey",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["KeyID"] }),
    },
    TableSpec {
        slug: "keyword",
        table: "LibraryKeyword",
        primary_key: "LookupID",
        columns: &["LookupValue", "Comments"],
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItemKeyword", columns: &["LibraryKeyword"] }),
    },
    TableSpec {
        slug: "owner",
        table: "LibraryOwner",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["OwnerID"] }),
    },
    TableSpec {
        slug: "season",
        table: "LibrarySeason",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["SeasonID"] }),
    },
    TableSpec {
        slug: "skill",
        table: "LibrarySkill",
        primary_key: "LookupID",
        columns: SIMPLE_LOOKUP_COLUMNS,
        display: "LookupValue",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["SkillID"] }),
    },
    TableSpec {
        slug: "tag",
        table: "LibraryTag",
        primary_key: "TagID",
        columns: &["TagGroup", "TagName", "Comments"],
        display: "TagName",
        used_by: Some(UsedBy { table: "LibraryItemTag", columns: &["LibraryTag"] }),
    },
    TableSpec {
        slug: "tag-group",
        table: "LibraryTagGroup",
        primary_key: "TagGroupID",
        columns: &["TagGroupName", "Comments"],
        display: "TagGroupName",
        used_by: Some(UsedBy { table: "LibraryTag", columns: &["TagGroup"] }),
    },
    TableSpec {
        slug: "person",
        table: "LibraryPerson",
        primary_key: "PersonID",
        columns: &["LastName", "FirstName", "Dates", "Comments"],
        display: "SearchKey",
        used_by: Some(UsedBy {
            table: "LibraryItem",
            columns: &["ComposerID", "LyricistID", "ArrangerID"],
        }),
    },
    TableSpec {
        slug: "company",
        table: "LibraryCompany",
        primary_key: "CompanyID",
        columns: &["CompanyName", "Comments"],
        display: "CompanyName",
        used_by: Some(UsedBy { table: "LibraryItem", columns: &["PublisherID"] }),
    },
];

/// Look up the table spec for a URL slug.
pub fn table_for_slug(slug: &str) -> Option<&'static TableSpec> {
    TABLE_REGISTRY.iter().find(|spec| spec.slug == slug)
}

/// LibraryItem columns settable from the client, in insert order.
///
/// The server stamps DateAdded/AddedBy, DateModified/ModifiedBy and the
/// three denormalized sort keys itself; those are not listed here.
pub const ITEM_COLUMNS: &[&str] = &[
    "ItemTitle",
    "OtherTitle",
    "IsCollection",
    "CollectionID",
    "ComposerID",
    "LyricistID",
    "ArrangerID",
    "ArrangementID",
    "KeyID",
    "SkillID",
    "AccompanimentID",
    "HandbellEnsembleID",
    "SeasonID",
    "OwnerID",
    "PublisherID",
    "Duration",
    "Copyright",
    "Comments",
];

/// A many-to-many link between an item and a lookup table.
#[derive(Debug, Clone, Copy)]
pub struct LinkTable {
    /// Field name in the item record payload (a list of lookup ids).
    pub field: &'static str,
    pub table: &'static str,
    /// FK column pointing at the lookup table.
    pub link_column: &'static str,
}

/// Link tables cleared and repopulated on every item save.
pub const ITEM_LINKS: &[LinkTable] = &[
    LinkTable { field: "Keywords", table: "LibraryItemKeyword", link_column: "LibraryKeyword" },
    LinkTable { field: "Tags", table: "LibraryItemTag", link_column: "LibraryTag" },
];

/// A repeating child-record table owned by an item.
#[derive(Debug, Clone, Copy)]
pub struct SubrecordTable {
    /// Field name in the item record payload (a list of objects).
    pub field: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Subrecord tables cleared and repopulated on every item save.
pub const ITEM_SUBRECORDS: &[SubrecordTable] = &[
    SubrecordTable {
        field: "Performances",
        table: "LibraryPerformance",
        columns: &["PerformanceDate", "Comments"],
    },
    SubrecordTable {
        field: "Inventories",
        table: "LibraryInventory",
        columns: &[
            "InventoryDate",
            "InStockDate",
            "InStock",
            "LatestPrice",
            "AcquireCondition",
            "StorageLocation",
            "Comments",
        ],
    },
    SubrecordTable {
        field: "Parts",
        table: "LibraryPart",
        columns: &["PartName", "OnHand", "Needed", "Comments"],
    },
    SubrecordTable {
        field: "Loans",
        table: "LibraryLoan",
        columns: &["LoanRecipient", "LoanDate", "LoanReturned", "Comments"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_resolve_to_their_tables() {
        assert_eq!(table_for_slug("season").unwrap().table, "LibrarySeason");
        assert_eq!(table_for_slug("tag").unwrap().primary_key, "TagID");
        assert!(table_for_slug("no-such-slug").is_none());
    }

    #[test]
    fn registry_slugs_are_unique() {
        let mut slugs: Vec<_> = TABLE_REGISTRY.iter().map(|spec| spec.slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), TABLE_REGISTRY.len());
    }
}
