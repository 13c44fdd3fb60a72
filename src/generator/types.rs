//! PostgreSQL type name mappers for the two desktop scripting targets.
//!
//! Total functions: any unmapped type falls back to the string type of the
//! target (`str` / `TEXT`).

/// Map a PostgreSQL data type to a readable PyQGIS field type hint
/// (used in generated comments only).
pub fn pg_type_to_pyqgis(data_type: &str) -> &'static str {
    match data_type {
        "integer" | "bigint" | "smallint" => "int",
        "numeric" | "double precision" | "real" => "float",
        "boolean" => "bool",
        "text" | "character varying" | "character" => "str",
        "date" => "QDate",
        "timestamp without time zone" | "timestamp with time zone" => "QDateTime",
        "uuid" | "json" | "jsonb" => "str",
        _ => "str",
    }
}

/// Map a PostgreSQL data type to an ArcPy field type string.
pub fn pg_type_to_arcpy(data_type: &str) -> &'static str {
    match data_type {
        "integer" => "LONG",
        "bigint" => "DOUBLE",
        "smallint" => "SHORT",
        "numeric" | "double precision" => "DOUBLE",
        "real" => "FLOAT",
        "boolean" => "SHORT",
        "text" | "character varying" | "character" => "TEXT",
        "date" | "timestamp without time zone" | "timestamp with time zone" => "DATE",
        "uuid" | "json" | "jsonb" => "TEXT",
        _ => "TEXT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyqgis_mappings() {
        let cases = [
            ("integer", "int"),
            ("bigint", "int"),
            ("smallint", "int"),
            ("numeric", "float"),
            ("double precision", "float"),
            ("real", "float"),
            ("boolean", "bool"),
            ("text", "str"),
            ("character varying", "str"),
            ("character", "str"),
            ("date", "QDate"),
            ("timestamp without time zone", "QDateTime"),
            ("timestamp with time zone", "QDateTime"),
            ("uuid", "str"),
            ("json", "str"),
            ("jsonb", "str"),
        ];
        for (pg, expected) in cases {
            assert_eq!(pg_type_to_pyqgis(pg), expected, "pg type {pg}");
        }
    }

    #[test]
    fn test_arcpy_mappings() {
        let cases = [
            ("integer", "LONG"),
            ("bigint", "DOUBLE"),
            ("smallint", "SHORT"),
            ("numeric", "DOUBLE"),
            ("double precision", "DOUBLE"),
            ("real", "FLOAT"),
            ("boolean", "SHORT"),
            ("text", "TEXT"),
            ("character varying", "TEXT"),
            ("character", "TEXT"),
            ("date", "DATE"),
            ("timestamp without time zone", "DATE"),
            ("timestamp with time zone", "DATE"),
            ("uuid", "TEXT"),
            ("json", "TEXT"),
            ("jsonb", "TEXT"),
        ];
        for (pg, expected) in cases {
            assert_eq!(pg_type_to_arcpy(pg), expected, "pg type {pg}");
        }
    }

    #[test]
    fn test_unmapped_types_fall_back() {
        assert_eq!(pg_type_to_pyqgis("geography"), "str");
        assert_eq!(pg_type_to_pyqgis("tsvector"), "str");
        assert_eq!(pg_type_to_arcpy("geography"), "TEXT");
        assert_eq!(pg_type_to_arcpy("int4range"), "TEXT");
    }
}
