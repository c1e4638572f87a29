use crate::args::OutputFormat;
use serde::Serialize;
use std::io::Write;
use tessera::typemap::{Category, Entity, Namespace, Summary, Symbol};

/// Serializable view of a registered entity.
#[derive(Debug, Serialize)]
pub struct EntityView {
    pub key: Symbol,
    pub name: String,
    pub category: Category,
    pub namespaces: Vec<Namespace>,
    pub aliases: Vec<Symbol>,
}

impl From<&dyn Entity> for EntityView {
    fn from(entity: &dyn Entity) -> Self {
        Self {
            key: entity.key().clone(),
            name: entity.name().to_owned(),
            category: entity.category(),
            namespaces: entity.namespaces().to_vec(),
            aliases: entity.aliases().to_vec(),
        }
    }
}

impl EntityView {
    fn line(&self) -> String {
        let namespaces = match self.namespaces.as_slice() {
            [] => Namespace::BASE.to_owned(),
            list => list.iter().map(Namespace::as_str).collect::<Vec<_>>().join(","),
        };
        let mut line = format!("{:<9} {:<16} {:<16} [{namespaces}]", self.category.as_str(), self.key.as_str(), self.name);
        if !self.aliases.is_empty() {
            let aliases = self.aliases.iter().map(Symbol::as_str).collect::<Vec<_>>().join(", ");
            line.push_str(&format!(" aka {aliases}"));
        }
        line
    }
}

pub fn summary(out: &mut impl Write, format: OutputFormat, summary: &Summary) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{summary}")?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?,
    }
    Ok(())
}

pub fn entities(out: &mut impl Write, format: OutputFormat, views: &[EntityView]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for view in views {
                writeln!(out, "{}", view.line())?;
            }
        },
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(views)?)?,
    }
    Ok(())
}

pub fn entity(out: &mut impl Write, format: OutputFormat, view: &EntityView) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", view.line())?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(view)?)?,
    }
    Ok(())
}
