//! Rendering of a Rust constants module from project metadata.
//!
//! `witkit fields generate` fetches the work item types, field definitions
//! and relation types of a project and renders them as a module of string
//! constants, so downstream tooling can reference `field::TEST_STEPS` instead
//! of retyping `"Microsoft.VSTS.TCM.Steps"`.

use std::collections::HashSet;

use crate::models::{FieldDefinition, RelationTypeDefinition, WorkItemTypeDefinition};

/// Mangles a display name into a SCREAMING_SNAKE_CASE identifier.
///
/// Non-alphanumeric runs collapse to a single underscore, camelCase
/// boundaries get an underscore, and names starting with a digit are
/// prefixed so the result is a valid Rust identifier.
pub fn const_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower_or_digit {
                out.push('_');
            }
            prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_uppercase());
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        }
    }

    let trimmed = out.trim_matches('_');
    let mut ident = if trimmed.is_empty() {
        "UNNAMED".to_string()
    } else {
        trimmed.to_string()
    };
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Returns `const_ident(name)` made unique with a numeric suffix.
fn unique_ident(name: &str, used: &mut HashSet<String>) -> String {
    let base = const_ident(name);
    if used.insert(base.clone()) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Renders one `pub mod` of string constants.
fn render_section<'a, I>(out: &mut String, module: &str, entries: I)
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    let mut used = HashSet::new();
    out.push_str(&format!("pub mod {module} {{\n"));
    for (name, value) in entries {
        let ident = unique_ident(name, &mut used);
        out.push_str(&format!("    pub const {ident}: &str = {value:?};\n"));
    }
    out.push_str("}\n");
}

/// Renders the full constants module.
///
/// Work item type constants hold the type name itself; field and link type
/// constants hold the reference name.
pub fn render_constants_module(
    types: &[WorkItemTypeDefinition],
    fields: &[FieldDefinition],
    relations: &[RelationTypeDefinition],
) -> String {
    let mut out = String::new();
    out.push_str(
        "//! Azure DevOps reference name constants.\n\
         //!\n\
         //! Generated by `witkit fields generate`; do not edit by hand.\n\n",
    );

    render_section(
        &mut out,
        "work_item_type",
        types.iter().map(|t| (t.name.as_str(), t.name.as_str())),
    );
    out.push('\n');
    render_section(
        &mut out,
        "field",
        fields
            .iter()
            .map(|f| (f.name.as_str(), f.reference_name.as_str())),
    );
    out.push('\n');
    render_section(
        &mut out,
        "link_type",
        relations
            .iter()
            .map(|r| (r.name.as_str(), r.reference_name.as_str())),
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Identifier Mangling
    ///
    /// Tests display name to constant identifier conversion.
    ///
    /// ## Test Scenario
    /// - Mangles names with spaces, dots, camelCase and leading digits
    ///
    /// ## Expected Outcome
    /// - All results are valid SCREAMING_SNAKE_CASE Rust identifiers
    #[test]
    fn test_const_ident() {
        assert_eq!(const_ident("Test Case"), "TEST_CASE");
        assert_eq!(const_ident("Test Steps"), "TEST_STEPS");
        assert_eq!(const_ident("AreaPath"), "AREA_PATH");
        assert_eq!(const_ident("Microsoft.VSTS.TCM.Steps"), "MICROSOFT_VSTS_TCM_STEPS");
        assert_eq!(const_ident("Closed By (Deprecated)"), "CLOSED_BY_DEPRECATED");
        assert_eq!(const_ident("2FA Enabled"), "_2FA_ENABLED");
        assert_eq!(const_ident("  "), "UNNAMED");
        assert_eq!(const_ident("état"), "UNNAMED");
    }

    /// # Collision Suffixes
    ///
    /// Tests that identical identifiers get numbered suffixes.
    ///
    /// ## Test Scenario
    /// - Generates identifiers for three names that mangle identically
    ///
    /// ## Expected Outcome
    /// - The second and third occurrences get _2 and _3 suffixes
    #[test]
    fn test_unique_ident() {
        let mut used = HashSet::new();
        assert_eq!(unique_ident("Closed By", &mut used), "CLOSED_BY");
        assert_eq!(unique_ident("Closed-By", &mut used), "CLOSED_BY_2");
        assert_eq!(unique_ident("closed.by", &mut used), "CLOSED_BY_3");
    }

    /// # Module Rendering
    ///
    /// Tests rendering the full constants module.
    ///
    /// ## Test Scenario
    /// - Renders one type, two fields and one relation
    ///
    /// ## Expected Outcome
    /// - Each section holds its constants with the right values, and string
    ///   values with quotes or backslashes are escaped as Rust literals
    #[test]
    fn test_render_constants_module() {
        let types = vec![WorkItemTypeDefinition {
            name: "Test Case".to_string(),
            description: None,
        }];
        let fields = vec![
            FieldDefinition {
                name: "Steps".to_string(),
                reference_name: "Microsoft.VSTS.TCM.Steps".to_string(),
                field_type: None,
            },
            FieldDefinition {
                name: "Area Path".to_string(),
                reference_name: "System.AreaPath".to_string(),
                field_type: None,
            },
        ];
        let relations = vec![RelationTypeDefinition {
            name: "Parent".to_string(),
            reference_name: "System.LinkTypes.Hierarchy-Reverse".to_string(),
        }];

        let module = render_constants_module(&types, &fields, &relations);

        assert!(module.contains("pub mod work_item_type {"));
        assert!(module.contains("    pub const TEST_CASE: &str = \"Test Case\";"));
        assert!(module.contains("pub mod field {"));
        assert!(module.contains("    pub const STEPS: &str = \"Microsoft.VSTS.TCM.Steps\";"));
        assert!(module.contains("    pub const AREA_PATH: &str = \"System.AreaPath\";"));
        assert!(module.contains("pub mod link_type {"));
        assert!(module.contains(
            "    pub const PARENT: &str = \"System.LinkTypes.Hierarchy-Reverse\";"
        ));
        assert!(module.starts_with("//!"));
    }
}
