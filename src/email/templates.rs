//! HTML email bodies. Every user-controlled value goes through [`escape_html`].

use serde::Serialize;

/// A job line in the subscriber digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestJob {
    pub name: String,
    pub salary: f64,
    pub company: String,
    pub skills: Vec<String>,
}

/// A rendered template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Template name, used as metrics label.
    pub template: &'static str,
    pub subject: String,
    pub html: String,
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: sans-serif; color: #222;\">{}\
         <p style=\"color: #888; font-size: 12px;\">Jobhunter</p></body></html>",
        body
    )
}

fn format_salary(salary: f64) -> String {
    let whole = salary.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn interview_invitation(
    name: &str,
    job_title: &str,
    company_name: &str,
    confirmation_url: &str,
) -> Rendered {
    let body = format!(
        "<p>Hello {},</p>\
         <p>{} would like to invite you to an interview for the position <b>{}</b>.</p>\
         <p><a href=\"{}\">Confirm or decline the interview</a></p>",
        escape_html(name),
        escape_html(company_name),
        escape_html(job_title),
        escape_html(confirmation_url),
    );
    Rendered {
        template: "interview-invitation",
        subject: "Interview invitation".to_string(),
        html: layout(&body),
    }
}

pub fn interview_passed(
    name: &str,
    job_title: &str,
    company_name: &str,
    confirmation_url: &str,
) -> Rendered {
    let body = format!(
        "<p>Hello {},</p>\
         <p>Congratulations, you passed the interview for <b>{}</b> at {}.</p>\
         <p><a href=\"{}\">See your application</a></p>",
        escape_html(name),
        escape_html(job_title),
        escape_html(company_name),
        escape_html(confirmation_url),
    );
    Rendered {
        template: "interview-passed",
        subject: "Interview result".to_string(),
        html: layout(&body),
    }
}

pub fn interview_failed(name: &str, job_title: &str, company_name: &str) -> Rendered {
    let body = format!(
        "<p>Hello {},</p>\
         <p>Thank you for interviewing for <b>{}</b> at {}. \
         Unfortunately we will not move forward with your application.</p>",
        escape_html(name),
        escape_html(job_title),
        escape_html(company_name),
    );
    Rendered {
        template: "interview-failed",
        subject: "Interview result".to_string(),
        html: layout(&body),
    }
}

pub fn hired(name: &str, job_title: &str, company_name: &str) -> Rendered {
    let body = format!(
        "<p>Hello {},</p>\
         <p>Congratulations! {} has hired you as <b>{}</b>.</p>",
        escape_html(name),
        escape_html(company_name),
        escape_html(job_title),
    );
    Rendered {
        template: "hired",
        subject: "Congratulations, you are hired".to_string(),
        html: layout(&body),
    }
}

pub fn job_digest(name: &str, jobs: &[DigestJob]) -> Rendered {
    let rows: String = jobs
        .iter()
        .map(|job| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&job.name),
                escape_html(&job.company),
                format_salary(job.salary),
                escape_html(&job.skills.join(", ")),
            )
        })
        .collect();
    let body = format!(
        "<p>Hello {},</p>\
         <p>These new openings match your skills:</p>\
         <table><tr><th>Job</th><th>Company</th><th>Salary</th><th>Skills</th></tr>{}</table>",
        escape_html(name),
        rows,
    );
    Rendered {
        template: "job",
        subject: "Hot jobs are waiting for you".to_string(),
        html: layout(&body),
    }
}
