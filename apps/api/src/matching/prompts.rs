// All LLM prompt constants for the matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for resume extraction.
pub const RESUME_PARSE_SYSTEM: &str = "Extract the following details from the resume: \
    Education, Work Experience, Projects, Skills, and Total Years of Experience. \
    Respond with a JSON object.";

/// System prompt for job description extraction.
pub const JD_PARSE_SYSTEM: &str = "Identify and extract the required qualifications, \
    skills, and experience from the job description. Respond with a JSON object.";

/// System prompt for the resume ↔ JD evaluation. `{json_only}` is replaced with
/// `llm_client::prompts::JSON_ONLY_INSTRUCTION` before sending.
pub const MATCH_SYSTEM_TEMPLATE: &str = r#"Compare the candidate's resume with the job description and evaluate the match level and score for Education, Work and Project Experience, Skills, and Experience Years. Provide reasoning for each category.

EVALUATION GUIDELINES:

1. EDUCATION
   - Weigh the RELEVANCE of the field of study above the exact degree name.
   - A degree in a related technical field scores well for a technical role (e.g. Robotics or Computer Engineering for AI/ML roles: 75-85%).

2. WORK AND PROJECT EXPERIENCE
   - Value transferable skills; leadership and product roles often carry across industries.
   - Technical program management demonstrates technical understanding even without hands-on development.
   - Consumer-scale products (millions of users) count as equivalent to enterprise rollouts when the job mentions scale.
   - Conversational AI experience (voice assistants, chatbots) is directly relevant to roles involving LLMs or conversational interfaces.

3. SKILLS
   - Look for core skills that transfer between roles.
   - For technical roles, value the specific technical skills that match the job; missing a key required framework or tool puts skills at 60-70%.
   - Any coding or patent experience counts toward technical depth, even for product roles.

4. EXPERIENCE YEARS
   - Consider quantity AND relevance: many years in an unrelated field is a LOW score (level 1-3); fewer but highly relevant years score higher (level 4-5).
   - Be precise about explicit requirements such as "7+ years software engineering".

CALIBRATION:
- Product management roles outside the candidate's industry: 65-75% when the skills transfer.
- Technical roles where the candidate has adjacent but not hands-on experience: around 70-75%.
- Conversational AI roles with voice assistant or chatbot experience: 80-85%.

REASONING:
Be specific about why a candidate did not score higher. Name the missing skills, experiences or qualifications and the concrete gaps against the job requirements. For any score below 6/7, explain exactly what would need to improve. Avoid vague statements like "candidate has some relevant experience".

LEVELS (use the full 1-7 range):
- 1-2: completely mismatched profile
- 3-4: partial match with significant gaps
- 5-6: strong match with minor gaps
- 7: perfect match

{json_only}"#;

/// User prompt for the evaluation. Replace `{resume_json}` and `{jd_json}`.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"PARSED RESUME:
{resume_json}

PARSED JOB DESCRIPTION:
{jd_json}

Evaluate the match level (1-7, where 1 is lowest and 7 is highest) and match score (as a percentage) for Education, Work and Project Experience, Skills, and Experience Years, then give an overall match level and score. Provide detailed reasoning for each category and for the final match.

FORMATTING REQUIREMENTS:
1. Return ONLY a JSON object, with no text before or after it
2. Use double quotes (") for every key and string, never single quotes (')
3. match_score values are strings with a percent sign (e.g. "85%")
4. Do NOT include code block markers like ``` or ```json

Use exactly this structure:
{
  "education": {"match_level": 1-7, "match_score": "xx%", "reasoning": ""},
  "work_and_project_experience": {"match_level": 1-7, "match_score": "xx%", "reasoning": ""},
  "skills": {"match_level": 1-7, "match_score": "xx%", "reasoning": ""},
  "experience_year": {"match_level": 1-7, "match_score": "xx%", "reasoning": ""},
  "Final_match": {"match_level": 1-7, "Final_match_score": "xx%", "reasoning": ""}
}"#;

/// Prefix for the corrective hints appended on the single retry.
pub const RETRY_PREAMBLE: &str =
    "Your previous reply could not be parsed as JSON. Fix these problems:";
