use crate::dns_question_and_answer::{DnsAnswer, DnsQuestion};

/// Address handed out for every name when no resolver is configured
pub const PLACEHOLDER_ADDR: [u8; 4] = [8, 8, 8, 8];

/// TTL of locally synthesized answers, in seconds
pub const PLACEHOLDER_TTL: u32 = 60;

/// Answer a question without asking anyone.
/// This is a dummy implementation that returns 8.8.8.8 for all queries,
/// whatever the requested type.
pub fn answer_locally(question: &DnsQuestion) -> DnsAnswer {
    DnsAnswer::new_a_record(question.name.clone(), PLACEHOLDER_TTL, PLACEHOLDER_ADDR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_question_and_answer::{RecordClass, RecordType};

    #[test]
    fn test_answer_locally_ignores_query_type() {
        let question = DnsQuestion {
            name: "codecrafters.io".to_string(),
            qtype: RecordType::MX.to_u16(),
            qclass: RecordClass::CH.to_u16(),
        };

        let answer = answer_locally(&question);

        assert_eq!(answer.name, "codecrafters.io");
        assert_eq!(answer.rtype, RecordType::A.to_u16());
        assert_eq!(answer.rclass, RecordClass::IN.to_u16());
        assert_eq!(answer.ttl, 60);
        assert_eq!(answer.rdlength, 4);
        assert_eq!(answer.rdata, vec![8, 8, 8, 8]);
    }
}
