/// Tables the label store is read from.
///
/// The store is produced by a separate analysis run; this DDL documents the
/// shape the queries rely on and is used to build fixtures.
pub const SCHEMA_SQL: &str = r"
-- Analysed repositories
CREATE TABLE IF NOT EXISTS solutions (
    solution_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    repository_link TEXT NOT NULL,
    upload_date TEXT NOT NULL,
    prog_language TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_solutions_name ON solutions(name);

-- Per-repository severity score for each smell
CREATE TABLE IF NOT EXISTS solution_smells (
    solution_id TEXT NOT NULL REFERENCES solutions(solution_id) ON DELETE CASCADE,
    smell_name TEXT NOT NULL,
    severity REAL NOT NULL,
    PRIMARY KEY (solution_id, smell_name)
);

-- Individual positive occurrences
CREATE TABLE IF NOT EXISTS smells (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    solution_id TEXT NOT NULL REFERENCES solutions(solution_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    class TEXT NOT NULL,
    component TEXT NOT NULL,
    method TEXT
);
CREATE INDEX IF NOT EXISTS idx_smells_lookup ON smells(solution_id, name);
";
