//! Prompt builders for each phase.
//!
//! Every prompt ends with the JSON shape the phase expects back; the
//! structured generator enforces it.

use std::fmt::Write as _;

use cs_core::{AnalysisResult, MigrationStep, SourceFile};

/// Builds the analysis prompt over every input file.
pub(crate) fn analysis(files: &[SourceFile], target: &str, source: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert software architect analyzing code for migration to {target}.\n"
    );
    if let Some(source) = source {
        let _ = writeln!(prompt, "The code is currently written for {source}.");
    }
    prompt.push_str("\nAnalyze the following source files:\n\n");
    for file in files {
        let _ = write!(prompt, "FILE: {}\n{}\n\n", file.path, file.content);
    }
    let _ = write!(
        prompt,
        "Identify:\n\
         1. Architectural patterns used (e.g. MVC, Flux, Singleton).\n\
         2. External dependencies and libraries, based ONLY on import statements.\n\
         3. Potential challenges when migrating to {target}.\n\
         4. A brief summary of what the application does.\n\
         \n\
         Respond in strict JSON matching this schema:\n\
         {{\n  \
           \"patterns\": string[],\n  \
           \"dependencies\": string[],\n  \
           \"potentialIssues\": string[],\n  \
           \"summary\": string\n\
         }}\n"
    );
    prompt
}

/// Builds the planning prompt from the analysis digest and the input paths.
pub(crate) fn plan(analysis: &AnalysisResult, target: &str, files: &[SourceFile]) -> String {
    let available = files
        .iter()
        .map(|f| f.path.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an expert technical project manager. Based on the analysis of a legacy \
         application, produce a detailed migration plan to {target}.\n\
         \n\
         Analysis Report:\n\
         {digest}\n\
         \n\
         Available Source Files:\n\
         {available}\n\
         \n\
         Create a step-by-step plan.\n\
         IMPORTANT: the \"file\" field of every step MUST match EXACTLY one of the paths in \
         \"Available Source Files\" above. Do not add prefixes such as \"src/\" or change the path.\n\
         Do NOT propose creating new files.\n\
         Do NOT propose improvements or enhancements. Migrate ONLY what exists.\n\
         \n\
         Order steps topologically by their dependencies.\n\
         Assign a complexity (low, medium, high) to each step.\n\
         \n\
         Respond in strict JSON matching this schema:\n\
         {{\n  \
           \"steps\": [\n    \
             {{\n      \
               \"id\": string,\n      \
               \"description\": string,\n      \
               \"dependencies\": string[],\n      \
               \"complexity\": \"low\" | \"medium\" | \"high\",\n      \
               \"file\": string\n    \
             }}\n  \
           ],\n  \
           \"rationale\": string\n\
         }}\n",
        digest = analysis.digest(),
    )
}

/// Builds the prompt for one execution step.
pub(crate) fn step(step: &MigrationStep, source: &SourceFile, target: &str) -> String {
    format!(
        "You are an expert developer performing a migration to {target}.\n\
         \n\
         Task: execute step \"{description}\" for file \"{file}\".\n\
         \n\
         Source Code:\n\
         {content}\n\
         \n\
         Instructions:\n\
         1. Analyze the source code and the task.\n\
         2. Plan the code changes (thought).\n\
         3. Generate the full migrated code.\n\
         4. STRICTLY MIGRATE ONLY WHAT IS PRESENT. Do NOT add best practices, extra error \
         handling, validation, or other improvements.\n\
         5. If the source has no error handling, the migrated code MUST NOT have any.\n\
         6. Express any suggested improvement as a COMMENT, never as code.\n\
         7. Do NOT invent imports.\n\
         \n\
         Respond in strict JSON:\n\
         {{\n  \
           \"thought\": \"What needs to change and why...\",\n  \
           \"code\": \"The full migrated code...\",\n  \
           \"status\": \"success\" | \"failed\"\n\
         }}\n",
        description = step.description,
        file = step.file,
        content = source.content,
    )
}

/// Builds the prompt that compares one original file with its migration.
pub(crate) fn verification(original: &SourceFile, migrated: &str, target: &str) -> String {
    format!(
        "You are a QA engineer verifying a code migration to {target}.\n\
         \n\
         Original File ({path}):\n\
         {content}\n\
         \n\
         Migrated Code:\n\
         {migrated}\n\
         \n\
         Tasks:\n\
         1. Check that the migrated code matches the original functionality.\n\
         2. Identify missing imports or broken references.\n\
         3. Check adherence to {target} idioms while strictly keeping the original logic.\n\
         4. Flag as an issue any enhancement or improvement that the original doesn't have \
         (for example added error handling).\n\
         5. Flag as an issue any hallucinated code.\n\
         \n\
         Respond in strict JSON:\n\
         {{\n  \
           \"path\": \"{path}\",\n  \
           \"success\": boolean,\n  \
           \"issues\": string[],\n  \
           \"summary\": \"Short verification summary\"\n\
         }}\n",
        path = original.path,
        content = original.content,
    )
}
