//! Orchestration prompt assembly
//!
//! The prompt instructs the agent to read both input files with its own tools,
//! refine the resume over several passes, and write the result itself. The
//! "analyst" roles below are prompt text, not types: the agent plays them.

use std::path::Path;

/// Build the orchestration prompt for one customization run.
#[must_use]
pub fn build_orchestrator_prompt(
    resume_path: &Path,
    job_path: &Path,
    output_path: &Path,
    iterations: u32,
) -> String {
    format!(
        "You are an expert resume customization orchestrator. Customize a resume \
for a specific job application through {iterations} refinement passes.

## Input Files
- Resume: {resume}
- Job Description: {job}

## Output File
- Customized Resume: {output}

## Analysis Roles
Work through these perspectives in order on every pass:
1. Resume analyst: catalog sections, skills, achievements, quantified results,
   and career progression, including transferable skills that are not obvious.
2. Job requirements analyst: extract required and preferred qualifications,
   ATS keywords, seniority level, and the role's main responsibilities.
3. Gap analyst: compare the two, find missing keywords, under-highlighted
   experience, and the accomplishments that best match the role.
4. ATS reviewer: standard section headings, consistent dates, keywords
   integrated naturally, no tables or graphics.
5. Content editor: rewrite bullet points to lead with impact, quantify where
   the source material supports it, and tailor the summary to this role.
6. Quality reviewer: truthfulness, consistent voice and tense, coherent career
   story, grammar, appropriate length (one to two pages).

## Refinement Passes
- Pass 1: read both input files fully, run the analyses, and draft a first
  customized version emphasizing the most relevant experience.
- Middle passes: strengthen bullet points, verify keyword coverage, and fix
  anything the ATS reviewer flags.
- Final pass: quality review, polish the language, and confirm every stated
  requirement of the job is addressed somewhere in the resume.

## Hard Constraints
1. Truthfulness: never invent experience, skills, dates, or numbers. Only
   reorganize, reframe, and emphasize what the original resume contains.
2. ATS compatibility: standard section names, clean markdown, no tables.
3. Relevance: de-emphasize material that does not support this application.
4. Professional tone throughout.

If the input resume is minimal, still produce a properly structured document
and mark clearly where the candidate must fill in missing information.

## Execution
Read the input files first. After your final pass, write the finished resume
to the output file with the Write tool. Always create the output file, even
for minimal input.",
        iterations = iterations,
        resume = resume_path.display(),
        job = job_path.display(),
        output = output_path.display(),
    )
}
