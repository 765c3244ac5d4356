//! NR Positioning Protocol A (3GPP TS 38.455)
//!
//! NRPPa is exchanged between the LMF and the NG-RAN node inside NGAP containers, so it is only
//! reachable by name. The envelope is that of F1AP plus an `NRPPATransactionID`.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::per::{
    decode_protocol_ies, read_cause, read_named_enumerated, read_protocol_ie_container,
    CauseGroup, Criticality, IEValue, PduKind, PerReader, ProtocolIE,
};
use crate::registry::Registry;

const MAX_PROTOCOL_IES: u64 = 65535;
const MAX_TRANSACTION_ID: u64 = 32767;

pub const NRPPA_PROC_PRIVATE_MESSAGE: u8 = 1;

pub const ID_CAUSE: u16 = 0;
pub const ID_CRITICALITY_DIAGNOSTICS: u16 = 1;
pub const ID_LMF_UE_MEASUREMENT_ID: u16 = 2;
pub const ID_REPORT_CHARACTERISTICS: u16 = 3;
pub const ID_MEASUREMENT_PERIODICITY: u16 = 4;
pub const ID_MEASUREMENT_QUANTITIES: u16 = 5;
pub const ID_RAN_UE_MEASUREMENT_ID: u16 = 6;
pub const ID_E_CID_MEASUREMENT_RESULT: u16 = 7;
pub const ID_OTDOA_CELLS: u16 = 8;

pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.named.register("nrppa", NRPPa::creator)
}

pub fn procedure_name(code: u8) -> &'static str {
    match code {
        0 => "errorIndication",
        NRPPA_PROC_PRIVATE_MESSAGE => "privateMessage",
        2 => "e-CIDMeasurementInitiation",
        3 => "e-CIDMeasurementFailureIndication",
        4 => "e-CIDMeasurementReport",
        5 => "e-CIDMeasurementTermination",
        6 => "oTDOAInformationExchange",
        7 => "assistanceInformationControl",
        8 => "assistanceInformationFeedback",
        9 => "positioningInformationExchange",
        10 => "positioningInformationUpdate",
        11 => "Measurement",
        12 => "MeasurementReport",
        13 => "MeasurementUpdate",
        14 => "MeasurementAbort",
        15 => "MeasurementFailureIndication",
        16 => "tRPInformationExchange",
        17 => "positioningActivation",
        18 => "positioningDeactivation",
        _ => "Unknown",
    }
}

pub fn ie_name(id: u16) -> &'static str {
    match id {
        ID_CAUSE => "Cause",
        ID_CRITICALITY_DIAGNOSTICS => "CriticalityDiagnostics",
        ID_LMF_UE_MEASUREMENT_ID => "LMF-UE-Measurement-ID",
        ID_REPORT_CHARACTERISTICS => "ReportCharacteristics",
        ID_MEASUREMENT_PERIODICITY => "MeasurementPeriodicity",
        ID_MEASUREMENT_QUANTITIES => "MeasurementQuantities",
        ID_RAN_UE_MEASUREMENT_ID => "RAN-UE-Measurement-ID",
        ID_E_CID_MEASUREMENT_RESULT => "E-CID-MeasurementResult",
        ID_OTDOA_CELLS => "OTDOACells",
        _ => "Unknown",
    }
}

const CAUSE_GROUPS: &[CauseGroup] = &[
    (
        "radioNetwork",
        &[
            "unspecified",
            "requested-item-not-supported",
            "requested-item-temporarily-not-available",
        ],
    ),
    (
        "protocol",
        &[
            "transfer-syntax-error",
            "abstract-syntax-error-reject",
            "abstract-syntax-error-ignore-and-notify",
            "message-not-compatible-with-receiver-state",
            "semantic-error",
            "unspecified",
            "abstract-syntax-error-falsely-constructed-message",
        ],
    ),
    ("misc", &["unspecified"]),
];

const REPORT_CHARACTERISTICS: &[&str] = &["onDemand", "periodic"];

const MEASUREMENT_PERIODICITY: &[&str] = &[
    "ms120", "ms240", "ms480", "ms640", "ms1024", "ms2048", "ms5120", "ms10240", "min1", "min6",
    "min12", "min30", "min60",
];

fn decode_ie(id: u16, value: &[u8]) -> Result<Option<IEValue>, Error> {
    let mut reader = PerReader::new(value);

    let decoded = match id {
        ID_CAUSE => read_cause(&mut reader, CAUSE_GROUPS)?,
        // UE-Measurement-ID ::= INTEGER (1..15, ..., 16..256)
        ID_LMF_UE_MEASUREMENT_ID | ID_RAN_UE_MEASUREMENT_ID => {
            IEValue::Integer(reader.read_integer(1, 15, true)?)
        }
        ID_REPORT_CHARACTERISTICS => {
            read_named_enumerated(&mut reader, REPORT_CHARACTERISTICS, true)?
        }
        ID_MEASUREMENT_PERIODICITY => {
            read_named_enumerated(&mut reader, MEASUREMENT_PERIODICITY, true)?
        }
        ID_CRITICALITY_DIAGNOSTICS
        | ID_MEASUREMENT_QUANTITIES
        | ID_E_CID_MEASUREMENT_RESULT
        | ID_OTDOA_CELLS => IEValue::Opaque(value.into()),
        _ => return Ok(None),
    };

    Ok(Some(decoded))
}

#[derive(Debug, Default, Serialize)]
pub struct NRPPa {
    pdu: PduKind,
    procedure_code: u8,
    procedure_name: &'static str,
    criticality: Criticality,
    transaction_id: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ies: Vec<ProtocolIE>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    value: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl NRPPa {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<NRPPa>::default()
    }

    pub fn transaction_id(&self) -> u16 {
        self.transaction_id
    }

    pub fn ies(&self) -> &[ProtocolIE] {
        &self.ies
    }
}

impl Layer for NRPPa {
    fn decode_bytes(
        &mut self,
        _registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let mut reader = PerReader::new(bytes);

        self.pdu = match PduKind::from_reader(&mut reader)? {
            Some(pdu) => pdu,
            None => {
                self.notes
                    .push(Note::UnknownType("NRPPA-PDU extension".to_string()));
                self.value = bytes.into();
                return Ok((None, bytes.len()));
            }
        };
        self.procedure_code = reader.read_constrained_whole_number(0, 255)? as u8;
        self.procedure_name = procedure_name(self.procedure_code);
        self.criticality = Criticality::from_reader(&mut reader)?;
        self.transaction_id = reader.read_constrained_whole_number(0, MAX_TRANSACTION_ID)? as u16;

        let value = reader.read_open_type()?;
        if self.procedure_code == NRPPA_PROC_PRIVATE_MESSAGE {
            self.notes.push(Note::UnknownType(
                "private message IEs are not decoded".to_string(),
            ));
            self.value = value.into();
            return Ok((None, reader.byte_offset()));
        }

        let mut message = PerReader::new(value);
        let (extended, _) = message.read_sequence_preamble(true, 0)?;
        let fields = read_protocol_ie_container(&mut message, MAX_PROTOCOL_IES)?;
        self.ies = decode_protocol_ies(&fields, ie_name, |id, bytes, _| decode_ie(id, bytes));
        if extended {
            self.notes.push(Note::UnknownType(
                "message extension additions".to_string(),
            ));
        }

        Ok((None, reader.byte_offset()))
    }

    fn name(&self) -> &'static str {
        "NRPPa"
    }

    fn short_name(&self) -> &'static str {
        "nrppa"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(bytes: &str) -> serde_json::Value {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(bytes).unwrap();

        let mut nrppa = NRPPa::default();
        let (next, consumed) = nrppa.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, bytes.len());

        serde_json::to_value(&nrppa).unwrap()
    }

    #[test]
    fn e_cid_measurement_initiation_request() {
        let value = decode(concat!(
            "0002000007",
            "12",
            "000003",
            "0002000120",
            "0003000140",
            "0004000120",
        ));
        assert_eq!(value["procedure_name"], json!("e-CIDMeasurementInitiation"));
        assert_eq!(value["transaction_id"], json!(7));
        assert_eq!(value["ies"][0]["name"], json!("LMF-UE-Measurement-ID"));
        assert_eq!(value["ies"][0]["value"], json!({"integer": 5}));
        assert_eq!(
            value["ies"][1]["value"],
            json!({"enumerated": {"value": 1, "name": "periodic"}})
        );
        assert_eq!(
            value["ies"][2]["value"],
            json!({"enumerated": {"value": 4, "name": "ms1024"}})
        );
    }

    #[test]
    fn e_cid_measurement_initiation_failure() {
        let value = decode(concat!("4002000007", "08", "000001", "0000400108"));
        assert_eq!(value["pdu"], json!("unsuccessful_outcome"));
        assert_eq!(
            value["ies"][0],
            json!({
                "id": 0,
                "name": "Cause",
                "criticality": "ignore",
                "value": {"cause": {
                    "group": "radioNetwork",
                    "value": 1,
                    "name": "requested-item-not-supported",
                }},
            })
        );
    }

    #[test]
    fn private_message_is_kept_opaque() {
        let value = decode(concat!("0001400000", "03", "0a0b0c"));
        assert_eq!(value["procedure_name"], json!("privateMessage"));
        assert_eq!(value["criticality"], json!("ignore"));
        assert_eq!(value["value"], json!("0a0b0c"));
        assert_eq!(value["notes"][0]["kind"], json!("unknown_type"));
    }

    #[test]
    fn reachable_by_name() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode("4002000007080000010000400108").unwrap();

        let first = registry.named.create("nrppa").unwrap();
        let chain = crate::packet::decode_chain(&registry, first, &bytes);
        assert!(chain.error.is_none());
        assert_eq!(chain.consumed, bytes.len());
        assert_eq!(chain.layers[0].short_name(), "nrppa");
    }
}
