use crate::cli::{SchemaArgs, SchemaKind};
use crate::config::Config;
use crate::workflow::{schema_value, ImplementationPlan, QualityReport, TechDesign};

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.kind {
        SchemaKind::Config => schema_value::<Config>()?,
        SchemaKind::Design => schema_value::<TechDesign>()?,
        SchemaKind::Plan => schema_value::<ImplementationPlan>()?,
        SchemaKind::Report => schema_value::<QualityReport>()?,
    };
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
