// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Payload Tables
 * Declarative payloads and response signatures used by the dynamic testers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

/// XSS payload variants. `{m}` is replaced with a per-scan random marker so
/// reflections are attributable to our probe and not page content.
/// Covers reflected text, HTML attribute, DOM hash/search, JSON,
/// event-handler, SVG and template-literal contexts.
pub const XSS_PAYLOAD_TEMPLATES: [&str; 12] = [
    // Plain reflection probe (never flagged alone, used to locate echoes)
    "{m}",
    // Unescaped tag
    "<{m}>",
    // Script context
    "<script>{m}()</script>",
    // Attribute breakout, double quoted
    "\"><img src=x onerror={m}()>",
    // Attribute breakout, single quoted
    "'><svg onload={m}()>",
    // Event handler inside an existing attribute
    "\" on{m}=\"alert(1)",
    // javascript: URI
    "javascript:{m}()",
    // SVG vector
    "<svg/onload={m}()>",
    // Template literal breakout
    "${{m}}",
    // JSON string breakout
    "\"},{\"{m}\":\"",
    // DOM hash probe
    "#<img src=x onerror={m}()>",
    // Closing-comment breakout
    "--></script><script>{m}()</script>",
];

pub fn xss_payloads(marker: &str) -> Vec<String> {
    XSS_PAYLOAD_TEMPLATES
        .iter()
        .map(|t| t.replace("{m}", marker))
        .collect()
}

/// SQL injection probes: quote, boolean, union and parenthesis-mismatch
/// forms. Safe to send: they trigger database errors, never data change.
pub const SQLI_PAYLOADS: [&str; 7] = [
    "'",
    "\"",
    "' OR '1'='1",
    "' AND '1'='2",
    "' UNION SELECT NULL--",
    "')",
    "';--",
];

/// A database error signature with the engine family it identifies
#[derive(Debug, Clone, Copy)]
pub struct SqlErrorSignature {
    pub family: &'static str,
    pub pattern: &'static str,
}

/// Curated error signatures across five database families. A single match
/// in a probe response is sufficient evidence of error-based injection.
pub const SQL_ERROR_SIGNATURES: &[SqlErrorSignature] = &[
    // MySQL / MariaDB
    SqlErrorSignature { family: "MySQL", pattern: "You have an error in your SQL syntax" },
    SqlErrorSignature { family: "MySQL", pattern: "Warning: mysql_" },
    SqlErrorSignature { family: "MySQL", pattern: "Warning: mysqli_" },
    SqlErrorSignature { family: "MySQL", pattern: "MySQL server version for the right syntax" },
    SqlErrorSignature { family: "MySQL", pattern: "check the manual that corresponds to your MySQL" },
    SqlErrorSignature { family: "MySQL", pattern: "check the manual that corresponds to your MariaDB" },
    SqlErrorSignature { family: "MySQL", pattern: "Unknown column" },
    SqlErrorSignature { family: "MySQL", pattern: "mysql_fetch_array()" },
    SqlErrorSignature { family: "MySQL", pattern: "mysql_num_rows()" },
    SqlErrorSignature { family: "MySQL", pattern: "MySqlException" },
    // PostgreSQL
    SqlErrorSignature { family: "PostgreSQL", pattern: "PostgreSQL query failed" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "pg_query()" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "pg_exec()" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "unterminated quoted string at or near" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "syntax error at or near" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "ERROR: parser: parse error" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "PSQLException" },
    SqlErrorSignature { family: "PostgreSQL", pattern: "invalid input syntax for" },
    // Microsoft SQL Server
    SqlErrorSignature { family: "MSSQL", pattern: "Unclosed quotation mark after the character string" },
    SqlErrorSignature { family: "MSSQL", pattern: "Incorrect syntax near" },
    SqlErrorSignature { family: "MSSQL", pattern: "Microsoft OLE DB Provider for SQL Server" },
    SqlErrorSignature { family: "MSSQL", pattern: "ODBC SQL Server Driver" },
    SqlErrorSignature { family: "MSSQL", pattern: "SqlException" },
    SqlErrorSignature { family: "MSSQL", pattern: "Conversion failed when converting the" },
    SqlErrorSignature { family: "MSSQL", pattern: "mssql_query()" },
    SqlErrorSignature { family: "MSSQL", pattern: "Procedure or function" },
    // Oracle
    SqlErrorSignature { family: "Oracle", pattern: "ORA-00933" },
    SqlErrorSignature { family: "Oracle", pattern: "ORA-00936" },
    SqlErrorSignature { family: "Oracle", pattern: "ORA-01756" },
    SqlErrorSignature { family: "Oracle", pattern: "ORA-01722" },
    SqlErrorSignature { family: "Oracle", pattern: "quoted string not properly terminated" },
    SqlErrorSignature { family: "Oracle", pattern: "oci_parse" },
    SqlErrorSignature { family: "Oracle", pattern: "OracleException" },
    // SQLite
    SqlErrorSignature { family: "SQLite", pattern: "SQLite/JDBCDriver" },
    SqlErrorSignature { family: "SQLite", pattern: "SQLite.Exception" },
    SqlErrorSignature { family: "SQLite", pattern: "SQLITE_ERROR" },
    SqlErrorSignature { family: "SQLite", pattern: "sqlite3.OperationalError" },
    SqlErrorSignature { family: "SQLite", pattern: "unrecognized token:" },
    SqlErrorSignature { family: "SQLite", pattern: "near \"'\": syntax error" },
    SqlErrorSignature { family: "SQLite", pattern: "no such column:" },
];

/// Path traversal probes: Unix/Windows path forms, URL-encoded,
/// double-encoded, null-byte and absolute-path variants.
pub const TRAVERSAL_PAYLOADS: [&str; 8] = [
    "../../../../etc/passwd",
    "../../../../../../etc/passwd",
    "..\\..\\..\\..\\windows\\win.ini",
    "%2e%2e%2f%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    "%252e%252e%252f%252e%252e%252fetc%252fpasswd",
    "../../../../etc/passwd%00",
    "/etc/passwd",
    "....//....//....//etc/passwd",
];

/// System-file signatures proving a traversal probe read a real file
pub const TRAVERSAL_SIGNATURES: &[&str] = &[
    "root:x:0:0:",
    "daemon:x:1:",
    "/bin/bash",
    "/usr/sbin/nologin",
    "[fonts]",
    "[extensions]",
    "[mci extensions]",
    "; for 16-bit app support",
];

/// Parameter names suggesting file access, probed first by the traversal
/// tester
pub const FILE_PARAM_HINTS: &[&str] = &[
    "file", "path", "page", "template", "doc", "document", "include",
    "dir", "folder", "name", "filename", "download", "view", "show",
];

/// Known CSRF token field naming conventions
pub const CSRF_TOKEN_NAMES: &[&str] = &[
    "csrf",
    "csrf_token",
    "csrftoken",
    "_token",
    "xsrf_token",
    "authenticity_token",
    "csrfmiddlewaretoken",
    "__requestverificationtoken",
    "anti-forgery",
    "_csrf",
];

/// Query parameters tried in turn against a protected page
pub const AUTH_BYPASS_PARAMS: [(&str, &str); 7] = [
    ("admin", "true"),
    ("debug", "true"),
    ("bypass", "1"),
    ("auth", "0"),
    ("role", "admin"),
    ("access", "granted"),
    ("su", "1"),
];

/// CDN hosts whose cross-origin script inclusion is informational rather
/// than a third-party supply-chain flag
pub const KNOWN_CDN_HOSTS: &[&str] = &[
    "cdn.jsdelivr.net",
    "cdnjs.cloudflare.com",
    "unpkg.com",
    "ajax.googleapis.com",
    "code.jquery.com",
    "stackpath.bootstrapcdn.com",
    "cdn.tailwindcss.com",
    "fonts.googleapis.com",
];
