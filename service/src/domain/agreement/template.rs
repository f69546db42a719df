//! Default [`Content`] of [`Agreement`]s drafted for a [`Listing`].

#[cfg(doc)]
use crate::domain::Agreement;
use crate::domain::{listing, Listing};

use super::{Clause, Clauses, Content, CountryCode, Preamble};

/// Name the default [`Preamble`] is signed off with, if the host has none.
const UNNAMED_HOST: &str = "Host";

/// Number of characters of a [`Listing`] description quoted as job duties.
const DUTIES_LEN: usize = 200;

impl Content {
    /// Drafts the default [`Content`] of an [`Agreement`] for the provided
    /// [`Listing`], signed off by its host with the provided name.
    ///
    /// Terms are governed by the default [`CountryCode`], and the period is
    /// left for the parties to agree on.
    #[must_use]
    pub fn template(listing: &Listing, host_name: Option<&str>) -> Self {
        let host_name = host_name.unwrap_or(UNNAMED_HOST);
        let (preamble, clauses) = match listing.kind {
            listing::Kind::Stay => {
                (stay_preamble(listing, host_name), stay_clauses(listing))
            }
            listing::Kind::Job => {
                (job_preamble(listing, host_name), job_clauses(listing))
            }
        };

        Self {
            preamble: Preamble(preamble),
            clauses: Clauses(
                clauses
                    .into_iter()
                    .zip(1..)
                    .map(|((title, content), order)| Clause {
                        title: title.to_owned(),
                        content,
                        order,
                    })
                    .collect(),
            ),
            country_code: CountryCode::default(),
            start_date: None,
            end_date: None,
        }
    }
}

fn stay_preamble(listing: &Listing, host_name: &str) -> String {
    format!(
        "Welcome to {} in {}.\n\n\
         This Smart Stay Agreement is designed to help both of us build \
         trust from day one. It's written in plain language so we both know \
         what's expected, and what's fair.\n\n\
         As your host, I'm committed to providing a safe, clean, and \
         welcoming space. As my guest, you're agreeing to treat the space \
         with respect and communicate openly if any issues arise.\n\n\
         This is more than a rental, it's a human connection across \
         borders. Let's make this season memorable for the right reasons.\n\n\
         - {host_name}",
        listing.title,
        listing.location(),
    )
}

fn job_preamble(listing: &Listing, host_name: &str) -> String {
    format!(
        "Welcome to {} in {}.\n\n\
         This agreement outlines the terms of your seasonal employment with \
         us. We believe in clear expectations, fair treatment, and open \
         communication.\n\n\
         As your employer, we commit to providing a safe work environment, \
         clear responsibilities, and timely payment. As our team member, \
         you're agreeing to show up with professionalism, respect, and a \
         willingness to learn.\n\n\
         Seasonal work is challenging but rewarding. Let's make this season \
         successful together.\n\n\
         - {host_name}",
        listing.title,
        listing.location(),
    )
}

#[expect(clippy::too_many_lines, reason = "plain text")]
fn stay_clauses(listing: &Listing) -> Vec<(&'static str, String)> {
    let (title, location, price) =
        (&listing.title, listing.location(), listing.price);
    vec![
        (
            "Duration & Location",
            format!(
                "Property: {title}\n\
                 Location: {location}\n\
                 Monthly Rate: €{price}\n\n\
                 The stay dates will be agreed upon between both parties \
                 before signing. Either party may end the stay early with 14 \
                 days' notice (or as required by local law)."
            ),
        ),
        (
            "Payment Terms",
            format!(
                "Rent: €{price} per month\n\
                 Due: First day of each month\n\
                 Payment Method: Bank transfer or as agreed\n\n\
                 A refundable security deposit may be required. Any deposits \
                 will be returned within 14 days of checkout, minus \
                 deductions for damages beyond normal wear and tear. Receipts \
                 will be provided for any deductions."
            ),
        ),
        (
            "House Rules & Responsibilities",
            "• Quiet hours: 22:00 - 07:00\n\
             • Common areas: Keep shared spaces clean and tidy\n\
             • Guests: Notify host in advance\n\
             • Smoking: [Specify policy]\n\
             • Pets: [Specify policy]\n\
             • Registration: Complete local registration requirements within \
             3 days of arrival\n\n\
             The guest agrees to maintain the property in good condition and \
             report any maintenance issues promptly."
                .to_owned(),
        ),
        (
            "Utilities & Services",
            "Included in rent:\n\
             • Basic utilities (electricity, water, heating)\n\
             • Internet/WiFi\n\
             • [Add other included services]\n\n\
             Not included:\n\
             • [Specify any exclusions]\n\n\
             If utility usage is excessive, the host may request reasonable \
             additional compensation."
                .to_owned(),
        ),
        (
            "Cultural Consideration",
            "Both parties acknowledge that cultural differences may exist in \
             communication styles, expectations, and daily habits.\n\n\
             We agree to:\n\
             • Approach differences with curiosity and respect\n\
             • Communicate openly when something feels unclear\n\
             • Resolve misunderstandings through conversation first\n\
             • Seek to understand before being understood\n\n\
             If language barriers exist, we'll use translation tools and \
             patience to ensure clear communication."
                .to_owned(),
        ),
        (
            "Termination & Exit",
            "Either party may terminate this agreement with 14 days written \
             notice (or as required by local law).\n\n\
             Early termination reasons may include:\n\
             • Change in personal circumstances\n\
             • Breach of agreement terms\n\
             • Mutual agreement\n\n\
             Upon termination:\n\
             • Guest returns keys and removes all belongings\n\
             • Host inspects property and returns deposit (minus any valid \
             deductions)\n\
             • Both parties confirm no outstanding obligations\n\n\
             Rent is not prorated for partial months unless otherwise agreed."
                .to_owned(),
        ),
        (
            "Dispute Resolution",
            "If a dispute arises, both parties agree to:\n\n\
             1. First, have a direct conversation to understand each other's \
             perspective\n\
             2. If unresolved, exchange written summaries of the issue\n\
             3. If still unresolved, seek local mediation services\n\
             4. Only pursue legal action as a final resort\n\n\
             We commit to acting in good faith and giving each other the \
             benefit of the doubt."
                .to_owned(),
        ),
        (
            "Legal Jurisdiction",
            "This agreement is governed by the laws of Austria (or the \
             country where the property is located).\n\n\
             Both parties acknowledge that:\n\
             • This is a template and should be reviewed by local \
             authorities if needed\n\
             • Local tenant protection laws may override certain clauses\n\
             • Registration with local authorities may be legally required\n\
             • Tax obligations may apply and are the responsibility of each \
             party\n\n\
             Neither party provides legal advice. Consult local legal \
             resources for specific questions."
                .to_owned(),
        ),
    ]
}

#[expect(clippy::too_many_lines, reason = "plain text")]
fn job_clauses(listing: &Listing) -> Vec<(&'static str, String)> {
    let (title, location, price) =
        (&listing.title, listing.location(), listing.price);
    let duties = listing
        .description
        .chars()
        .take(DUTIES_LEN)
        .collect::<String>();
    vec![
        (
            "Position & Duration",
            format!(
                "Position: {title}\n\
                 Location: {location}\n\
                 Compensation: €{price} per month\n\n\
                 Employment period will be agreed upon between both parties. \
                 This is seasonal employment with a defined end date."
            ),
        ),
        (
            "Responsibilities & Expectations",
            format!(
                "Primary duties:\n\
                 {duties}...\n\n\
                 Expected work schedule:\n\
                 • [Specify hours/days]\n\
                 • [Specify break periods]\n\
                 • [Specify overtime policy]\n\n\
                 The employee agrees to perform duties professionally and \
                 follow all workplace safety protocols."
            ),
        ),
        (
            "Compensation & Payment",
            format!(
                "Salary: €{price} per month\n\
                 Payment Schedule: [Specify - weekly/monthly]\n\
                 Payment Method: Bank transfer\n\n\
                 Additional benefits:\n\
                 • [Staff accommodation - specify if included]\n\
                 • [Meals - specify if included]\n\
                 • [Transportation - specify if included]\n\
                 • [Equipment provided]\n\n\
                 Overtime will be compensated according to local labor law."
            ),
        ),
        (
            "Work Environment & Safety",
            "The employer commits to:\n\
             • Providing a safe work environment\n\
             • Supplying necessary equipment and training\n\
             • Following all local health and safety regulations\n\
             • Addressing any workplace hazards promptly\n\n\
             The employee commits to:\n\
             • Following all safety protocols\n\
             • Using protective equipment when required\n\
             • Reporting any safety concerns immediately\n\
             • Participating in required safety training"
                .to_owned(),
        ),
        (
            "Cultural Consideration",
            "Both parties acknowledge that cultural differences may exist in \
             communication styles, work expectations, and team dynamics.\n\n\
             We agree to:\n\
             • Approach differences with respect and openness\n\
             • Communicate clearly about expectations\n\
             • Seek clarification when instructions are unclear\n\
             • Build trust through consistent actions\n\n\
             If language barriers exist, we'll use clear communication \
             methods and patience."
                .to_owned(),
        ),
        (
            "Termination",
            "Either party may terminate employment with [14] days written \
             notice.\n\n\
             Grounds for immediate termination:\n\
             • Serious misconduct or safety violations\n\
             • Breach of contract terms\n\
             • Mutual agreement\n\n\
             Upon termination:\n\
             • Final payment due within [7] days\n\
             • Return all company property\n\
             • Complete exit interview if requested\n\n\
             The employer will provide a work reference upon request if \
             employment ended in good standing."
                .to_owned(),
        ),
        (
            "Legal Compliance",
            "This agreement is governed by Austrian labor law (or the labor \
             law where work is performed).\n\n\
             Both parties acknowledge:\n\
             • Work permits/visas are the employee's responsibility\n\
             • Tax registration and contributions must be handled correctly\n\
             • Social insurance requirements must be met\n\
             • Local employment regulations apply\n\n\
             Neither party provides legal or tax advice. Consult local \
             authorities for specific requirements."
                .to_owned(),
        ),
    ]
}

#[cfg(test)]
mod spec {
    use crate::domain::{
        listing::{self, Kind},
        user, Listing,
    };

    use super::{Content, DUTIES_LEN};

    fn listing(kind: Kind) -> Listing {
        Listing {
            id: listing::Id::new(),
            owner_id: user::Id::new(),
            title: listing::Title::new("Alpine Hut").expect("valid"),
            kind,
            city: Some("Lech".into()),
            region: "Vorarlberg".into(),
            description: "Serving guests at the ski lodge. ".repeat(20),
            price: 1200.into(),
        }
    }

    fn titles(content: &Content) -> Vec<&str> {
        content.clauses.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn drafts_stay_terms() {
        let content = Content::template(&listing(Kind::Stay), Some("Hanna"));

        let preamble = content.preamble.as_ref();
        assert!(
            preamble.starts_with("Welcome to Alpine Hut in Lech, Vorarlberg."),
        );
        assert!(preamble.contains("Smart Stay Agreement"));
        assert!(preamble.ends_with("- Hanna"));
        assert_eq!(
            titles(&content),
            [
                "Duration & Location",
                "Payment Terms",
                "House Rules & Responsibilities",
                "Utilities & Services",
                "Cultural Consideration",
                "Termination & Exit",
                "Dispute Resolution",
                "Legal Jurisdiction",
            ],
        );
        assert!(content.clauses.iter().nth(1).is_some_and(|c| c
            .content
            .starts_with("Rent: €1200 per month")));
        assert_eq!(content.country_code.as_ref(), "AT");
        assert!(content.start_date.is_none() && content.end_date.is_none());
    }

    #[test]
    fn drafts_job_terms() {
        let l = listing(Kind::Job);

        let content = Content::template(&l, Some("Hanna"));

        let preamble = content.preamble.as_ref();
        assert!(preamble.contains("seasonal employment"));
        assert!(!preamble.contains("Smart Stay Agreement"));
        assert_eq!(
            titles(&content),
            [
                "Position & Duration",
                "Responsibilities & Expectations",
                "Compensation & Payment",
                "Work Environment & Safety",
                "Cultural Consideration",
                "Termination",
                "Legal Compliance",
            ],
        );
        let duties: String = l.description.chars().take(DUTIES_LEN).collect();
        assert!(content
            .clauses
            .iter()
            .nth(1)
            .is_some_and(|c| c.content.contains(&format!("{duties}..."))));
        assert!(!content
            .clauses
            .iter()
            .any(|c| c.content.contains(&l.description)));
    }

    #[test]
    fn orders_clauses_from_one() {
        let content = Content::template(&listing(Kind::Stay), None);

        let orders =
            content.clauses.iter().map(|c| c.order).collect::<Vec<_>>();
        assert_eq!(orders, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn falls_back_to_region_and_unnamed_host() {
        let content = Content::template(
            &Listing {
                city: None,
                ..listing(Kind::Job)
            },
            None,
        );

        let preamble = content.preamble.as_ref();
        assert!(preamble.starts_with("Welcome to Alpine Hut in Vorarlberg."));
        assert!(preamble.ends_with("- Host"));
    }
}
