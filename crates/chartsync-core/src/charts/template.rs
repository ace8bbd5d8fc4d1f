//! Static chart templates and typed identifier substitution.
//!
//! Every dynamic chart is declared once as a [`ChartTemplate`] whose ids are
//! [`IdTemplate`]s with indexed placeholders (`{0}`, `{1}`) and a declared
//! arity. Rendering checks the arity and rejects identifier parts that contain
//! reserved characters instead of producing an ambiguous id.

use crate::error::TemplateError;

use super::{Chart, ChartType, Dim, DimAlgorithm, Var};

/// Characters that may not appear in a chart id part (`type.id` separator).
const CHART_ID_RESERVED: &[char] = &['.'];

/// Identifier pattern with a declared number of placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdTemplate {
    pattern: &'static str,
    arity: usize,
}

impl IdTemplate {
    /// Declares a template. `arity` must equal the number of distinct
    /// placeholders in `pattern`; a mismatch is reported on every render.
    pub const fn new(pattern: &'static str, arity: usize) -> Self {
        Self { pattern, arity }
    }

    /// Template without placeholders.
    pub const fn fixed(pattern: &'static str) -> Self {
        Self { pattern, arity: 0 }
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Renders a dimension or variable id.
    pub fn render<S: AsRef<str>>(&self, parts: &[S]) -> Result<String, TemplateError> {
        self.render_checked(parts, &[])
    }

    /// Renders a chart id; additionally rejects [`CHART_ID_RESERVED`].
    pub fn render_chart_id<S: AsRef<str>>(&self, parts: &[S]) -> Result<String, TemplateError> {
        self.render_checked(parts, CHART_ID_RESERVED)
    }

    fn render_checked<S: AsRef<str>>(
        &self,
        parts: &[S],
        reserved: &[char],
    ) -> Result<String, TemplateError> {
        if parts.len() != self.arity {
            return Err(TemplateError::Arity {
                pattern: self.pattern,
                declared: self.arity,
                got: parts.len(),
            });
        }

        for part in parts {
            let part = part.as_ref();
            if let Some(ch) = part
                .chars()
                .find(|c| c.is_whitespace() || c.is_control() || reserved.contains(c))
            {
                return Err(TemplateError::ReservedChar {
                    pattern: self.pattern,
                    part: part.to_string(),
                    ch,
                });
            }
        }

        let malformed = || TemplateError::Malformed {
            pattern: self.pattern,
            declared: self.arity,
        };

        let mut out = String::with_capacity(self.pattern.len() + 16);
        let mut used: u32 = 0;
        let mut rest = self.pattern;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(malformed)?;
            let idx: usize = after[..close].parse().map_err(|_| malformed())?;
            let part = parts.get(idx).ok_or_else(malformed)?;
            out.push_str(part.as_ref());
            used |= 1u32.checked_shl(idx as u32).ok_or_else(malformed)?;
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        if used.count_ones() as usize != self.arity {
            return Err(malformed());
        }
        Ok(out)
    }
}

/// Dimension declaration inside a [`ChartTemplate`].
#[derive(Debug, Clone, Copy)]
pub struct DimTemplate {
    pub id: IdTemplate,
    pub name: &'static str,
    pub algorithm: DimAlgorithm,
    pub mul: i64,
    pub div: i64,
    pub hidden: bool,
}

impl DimTemplate {
    pub const fn absolute(id: IdTemplate, name: &'static str) -> Self {
        Self {
            id,
            name,
            algorithm: DimAlgorithm::Absolute,
            mul: 1,
            div: 1,
            hidden: false,
        }
    }

    pub const fn incremental(id: IdTemplate, name: &'static str) -> Self {
        Self {
            algorithm: DimAlgorithm::Incremental,
            ..Self::absolute(id, name)
        }
    }

    pub const fn percent_of_incremental_row(id: IdTemplate, name: &'static str) -> Self {
        Self {
            algorithm: DimAlgorithm::PercentageOfIncrementalRow,
            ..Self::absolute(id, name)
        }
    }

    pub const fn with_mul(self, mul: i64) -> Self {
        Self { mul, ..self }
    }

    pub const fn with_div(self, div: i64) -> Self {
        Self { div, ..self }
    }

    pub const fn hidden(self) -> Self {
        Self {
            hidden: true,
            ..self
        }
    }

    pub fn instantiate<S: AsRef<str>>(&self, parts: &[S]) -> Result<Dim, TemplateError> {
        Ok(Dim {
            id: self.id.render(parts)?,
            name: self.name.to_string(),
            algorithm: self.algorithm,
            mul: self.mul,
            div: self.div,
            hidden: self.hidden,
        })
    }
}

/// Static definition of one chart for an entity class or a fixed family.
#[derive(Debug, Clone, Copy)]
pub struct ChartTemplate {
    pub id: IdTemplate,
    pub title: &'static str,
    pub units: &'static str,
    pub family: &'static str,
    pub context: &'static str,
    pub chart_type: ChartType,
    pub priority: u32,
    pub dims: &'static [DimTemplate],
    pub vars: &'static [IdTemplate],
}

impl ChartTemplate {
    /// Builds a chart with `parts` substituted into every id.
    pub fn instantiate<S: AsRef<str>>(&self, parts: &[S]) -> Result<Chart, TemplateError> {
        let id = self.id.render_chart_id(parts)?;
        let dims = self
            .dims
            .iter()
            .map(|d| d.instantiate(parts))
            .collect::<Result<Vec<_>, _>>()?;
        let vars = self
            .vars
            .iter()
            .map(|v| v.render(parts).map(|id| Var { id }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Chart {
            id,
            title: self.title.to_string(),
            units: self.units.to_string(),
            family: self.family.to_string(),
            context: self.context.to_string(),
            chart_type: self.chart_type,
            priority: self.priority,
            labels: Default::default(),
            dims,
            vars,
        })
    }
}

/// Instantiates every template of a set with the same parts.
pub fn instantiate_all<S: AsRef<str>>(
    templates: &[ChartTemplate],
    parts: &[S],
) -> Result<Vec<Chart>, TemplateError> {
    templates.iter().map(|t| t.instantiate(parts)).collect()
}

/// Turns a raw name from a source into an id component.
///
/// Whitespace, `(`, `/`, `\` and `.` become `_`; `)` is dropped. Raw names
/// (`Default Web Site`, `Intel(R) PRO/1000`, `\_TZ.THRM`, `10.0.0.1`) go
/// through this before they become entity ids.
pub fn sanitize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|&c| c != ')')
        .map(|c| {
            if c.is_whitespace() || c.is_control() || matches!(c, '.' | '\\' | '/' | '(') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB_CHART: ChartTemplate = ChartTemplate {
        id: IdTemplate::new("mssql_db_{1}_instance_{0}_transactions", 2),
        title: "Transactions",
        units: "transactions/s",
        family: "transactions",
        context: "mssql.database_transactions",
        chart_type: ChartType::Line,
        priority: 1000,
        dims: &[DimTemplate::incremental(
            IdTemplate::new("mssql_db_{1}_instance_{0}_transactions", 2),
            "transactions",
        )],
        vars: &[],
    };

    #[test]
    fn test_render_indexed_placeholders() {
        let t = IdTemplate::new("mssql_db_{1}_instance_{0}_active", 2);
        assert_eq!(
            t.render(&["SQLEXPRESS", "master"]).unwrap(),
            "mssql_db_master_instance_SQLEXPRESS_active"
        );
    }

    #[test]
    fn test_render_fixed() {
        let t = IdTemplate::fixed("cpu_utilization_total");
        assert_eq!(t.render::<&str>(&[]).unwrap(), "cpu_utilization_total");
    }

    #[test]
    fn test_render_wrong_part_count() {
        let t = IdTemplate::new("cpu_core_{0}_dpcs", 1);
        let err = t.render(&["0,0", "extra"]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Arity {
                pattern: "cpu_core_{0}_dpcs",
                declared: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_render_pattern_disagrees_with_arity() {
        let t = IdTemplate::new("cpu_core_dpcs", 1);
        assert!(matches!(
            t.render(&["0,0"]),
            Err(TemplateError::Malformed { .. })
        ));

        let t = IdTemplate::new("cpu_core_{1}_dpcs", 1);
        assert!(matches!(
            t.render(&["0,0"]),
            Err(TemplateError::Malformed { .. })
        ));
    }

    #[test]
    fn test_render_rejects_whitespace() {
        let t = IdTemplate::new("iis_website_{0}_requests", 1);
        let err = t.render(&["Default Web Site"]).unwrap_err();
        assert!(matches!(err, TemplateError::ReservedChar { ch: ' ', .. }));
    }

    #[test]
    fn test_chart_id_rejects_dot_but_dim_id_allows_it() {
        let t = IdTemplate::new("peer_{0}_offset", 1);
        assert_eq!(t.render(&["10.0.0.1"]).unwrap(), "peer_10.0.0.1_offset");
        assert!(matches!(
            t.render_chart_id(&["10.0.0.1"]),
            Err(TemplateError::ReservedChar { ch: '.', .. })
        ));
    }

    #[test]
    fn test_disk_letter_colon_is_allowed() {
        let t = IdTemplate::new("logical_disk_{0}_free_space", 1);
        assert_eq!(
            t.render_chart_id(&["C:"]).unwrap(),
            "logical_disk_C:_free_space"
        );
    }

    #[test]
    fn test_instantiate_chart() {
        let chart = DB_CHART.instantiate(&["SQLEXPRESS", "master"]).unwrap();
        assert_eq!(chart.id, "mssql_db_master_instance_SQLEXPRESS_transactions");
        assert_eq!(chart.dims.len(), 1);
        assert_eq!(
            chart.dims[0].id,
            "mssql_db_master_instance_SQLEXPRESS_transactions"
        );
        assert_eq!(chart.dims[0].algorithm, DimAlgorithm::Incremental);
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Default Web Site"), "Default_Web_Site");
        assert_eq!(sanitize_id("\\_TZ.THRM"), "__TZ_THRM");
        assert_eq!(sanitize_id("C:"), "C:");
        assert_eq!(sanitize_id(" 10.0.0.1 "), "10_0_0_1");
        assert_eq!(
            sanitize_id("Intel(R) PRO/1000 MT Network Connection"),
            "Intel_R_PRO_1000_MT_Network_Connection"
        );
    }
}
