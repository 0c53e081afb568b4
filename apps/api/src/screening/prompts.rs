// All LLM prompt constants for the screening module.

/// System prompt for resume screening. Enforces JSON-only output.
pub const SCREENING_SYSTEM: &str =
    "You are an expert ATS (Applicant Tracking System) analyzing resumes for job positions. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Screening prompt template. Replace `{job_description}`, `{candidate_name}`
/// and `{resume_text}` before sending.
pub const SCREENING_PROMPT_TEMPLATE: &str = r#"Analyze the following resume against the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "matchScore": 75,
  "keySkillsMatched": ["skill1", "skill2"],
  "missingSkills": ["skill3"],
  "summary": "brief assessment"
}

Rules:
- matchScore: integer 0-100, how well the candidate matches the job requirements
- keySkillsMatched: the important skills from the job description that the candidate has
- missingSkills: important skills from the job description that are not evident in the resume
- summary: a brief 2-3 sentence summary of why this candidate is or is not a good fit

JOB DESCRIPTION:
{job_description}

RESUME (candidate: {candidate_name}):
{resume_text}"#;
