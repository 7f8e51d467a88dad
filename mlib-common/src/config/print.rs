//! Layout of the printable record view.
//!
//! One fieldset per block; subrecord fieldsets emit one block per child
//! row. Lookup resolution follows the (table, display columns, primary
//! key) triples below; a three-column lookup composes a person name.

/// Lookup triple for resolving a foreign key to display text.
#[derive(Debug, Clone, Copy)]
pub struct PrintLookup {
    pub table: &'static str,
    pub key: &'static str,
    /// One column for plain lookups, three (last, first, dates) for names.
    pub columns: &'static [&'static str],
}

/// How one printed field's value is produced.
#[derive(Debug, Clone, Copy)]
pub enum PrintKind {
    /// Raw column value.
    Text,
    /// 'Y'/'N' column rendered as Yes/No.
    YesNo,
    /// Numeric column rendered with two decimals.
    Money,
    /// Foreign key resolved through a lookup triple.
    Lookup(PrintLookup),
    /// Link-table values joined with "; ".
    Multiple {
        value_table: &'static str,
        value_column: &'static str,
        value_key: &'static str,
        link_table: &'static str,
        link_column: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct PrintField {
    pub label: &'static str,
    pub column: &'static str,
    pub kind: PrintKind,
}

#[derive(Debug, Clone, Copy)]
pub struct PrintFieldset {
    pub label: &'static str,
    /// When set, the name of the subrecord table whose rows each become
    /// one block; fields then refer to that table's columns.
    pub subrecord: Option<&'static str>,
    pub fields: &'static [PrintField],
}

const PERSON_LOOKUP: PrintLookup = PrintLookup {
    table: "LibraryPerson",
    key: "PersonID",
    columns: &["LastName", "FirstName", "Dates"],
};

const fn simple_lookup(table: &'static str) -> PrintLookup {
    PrintLookup { table, key: "LookupID", columns: &["LookupValue"] }
}

/// The full printable layout, in page order.
pub const PRINT_FIELDSETS: &[PrintFieldset] = &[
    PrintFieldset {
        label: "Identification",
        subrecord: None,
        fields: &[
            PrintField { label: "Title", column: "ItemTitle", kind: PrintKind::Text },
            PrintField { label: "Other Title", column: "OtherTitle", kind: PrintKind::Text },
            PrintField { label: "Is Collection", column: "IsCollection", kind: PrintKind::YesNo },
            PrintField {
                label: "Collection",
                column: "CollectionID",
                kind: PrintKind::Lookup(PrintLookup {
                    table: "LibraryItem",
                    key: "ItemID",
                    columns: &["ItemTitle"],
                }),
            },
            PrintField { label: "Composer", column: "ComposerID", kind: PrintKind::Lookup(PERSON_LOOKUP) },
            PrintField { label: "Lyricist", column: "LyricistID", kind: PrintKind::Lookup(PERSON_LOOKUP) },
            PrintField { label: "Arranger", column: "ArrangerID", kind: PrintKind::Lookup(PERSON_LOOKUP) },
        ],
    },
    PrintFieldset {
        label: "Classification",
        subrecord: None,
        fields: &[
            PrintField {
                label: "Arrangement",
                column: "ArrangementID",
                kind: PrintKind::Lookup(simple_lookup("LibraryArrangement")),
            },
            PrintField { label: "Key", column: "KeyID", kind: PrintKind::Lookup(simple_lookup("LibraryKey")) },
            PrintField { label: "Skill", column: "SkillID", kind: PrintKind::Lookup(simple_lookup("LibrarySkill")) },
            PrintField {
                label: "Accompaniment",
                column: "AccompanimentID",
                kind: PrintKind::Lookup(simple_lookup("LibraryAccompaniment")),
            },
            PrintField {
                label: "Handbell Ensemble",
                column: "HandbellEnsembleID",
                kind: PrintKind::Lookup(simple_lookup("LibraryHandbellEnsemble")),
            },
            PrintField { label: "Season", column: "SeasonID", kind: PrintKind::Lookup(simple_lookup("LibrarySeason")) },
            PrintField { label: "Owner", column: "OwnerID", kind: PrintKind::Lookup(simple_lookup("LibraryOwner")) },
            PrintField {
                label: "Keywords",
                column: "ItemID",
                kind: PrintKind::Multiple {
                    value_table: "LibraryKeyword",
                    value_column: "LookupValue",
                    value_key: "LookupID",
                    link_table: "LibraryItemKeyword",
                    link_column: "LibraryKeyword",
                },
            },
            PrintField {
                label: "Tags",
                column: "ItemID",
                kind: PrintKind::Multiple {
                    value_table: "LibraryTag",
                    value_column: "TagName",
                    value_key: "TagID",
                    link_table: "LibraryItemTag",
                    link_column: "LibraryTag",
                },
            },
        ],
    },
    PrintFieldset {
        label: "Publication",
        subrecord: None,
        fields: &[
            PrintField {
                label: "Publisher",
                column: "PublisherID",
                kind: PrintKind::Lookup(PrintLookup {
                    table: "LibraryCompany",
                    key: "CompanyID",
                    columns: &["CompanyName"],
                }),
            },
            PrintField { label: "Copyright", column: "Copyright", kind: PrintKind::Text },
            PrintField { label: "Duration", column: "Duration", kind: PrintKind::Text },
            PrintField { label: "Comments", column: "Comments", kind: PrintKind::Text },
            PrintField { label: "Date Added", column: "DateAdded", kind: PrintKind::Text },
            PrintField { label: "Added By", column: "AddedBy", kind: PrintKind::Text },
        ],
    },
    PrintFieldset {
        label: "Performance",
        subrecord: Some("LibraryPerformance"),
        fields: &[
            PrintField { label: "Date", column: "PerformanceDate", kind: PrintKind::Text },
            PrintField { label: "Comments", column: "Comments", kind: PrintKind::Text },
        ],
    },
    PrintFieldset {
        label: "Inventory",
        subrecord: Some("LibraryInventory"),
        fields: &[
            PrintField { label: "Inventory Date", column: "InventoryDate", kind: PrintKind::Text },
            PrintField { label: "In-Stock Date", column: "InStockDate", kind: PrintKind::Text },
            PrintField { label: "Copies", column: "InStock", kind: PrintKind::Text },
            PrintField { label: "Latest Price", column: "LatestPrice", kind: PrintKind::Money },
            PrintField { label: "Condition", column: "AcquireCondition", kind: PrintKind::Text },
            PrintField { label: "Storage Location", column: "StorageLocation", kind: PrintKind::Text },
            PrintField { label: "Comments", column: "Comments", kind: PrintKind::Text },
        ],
    },
    PrintFieldset {
        label: "Part",
        subrecord: Some("LibraryPart"),
        fields: &[
            PrintField { label: "Part Name", column: "PartName", kind: PrintKind::Text },
            PrintField { label: "On Hand", column: "OnHand", kind: PrintKind::Text },
            PrintField { label: "Needed", column: "Needed", kind: PrintKind::Text },
            PrintField { label: "Comments", column: "Comments", kind: PrintKind::Text },
        ],
    },
    PrintFieldset {
        label: "Loan",
        subrecord: Some("LibraryLoan"),
        fields: &[
            PrintField { label: "Recipient", column: "LoanRecipient", kind: PrintKind::Text },
            PrintField { label: "Loan Date", column: "LoanDate", kind: PrintKind::Text },
            PrintField { label: "Returned", column: "LoanReturned", kind: PrintKind::Text },
            PrintField { label: "Comments", column: "Comments", kind: PrintKind::Text },
        ],
    },
];
