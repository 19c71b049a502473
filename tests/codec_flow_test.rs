//! End-to-end codec scenarios against a realistic pair-contract ABI

use klever_sdk::abi::decode::{decode_base_value, decode_return, decode_value};
use klever_sdk::abi::encode::{encode_arg, encode_value};
use klever_sdk::call::build_call_data;
use klever_sdk::{AbiDocument, QueryResponse, Value};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const PAIR_ABI: &str = r#"{
    "endpoints": [
        {
            "name": "addLiquidity",
            "mutability": "mutable",
            "inputs": [
                {"name": "first_amount", "type": "BigUint"},
                {"name": "second_amount", "type": "BigUint"},
                {"name": "deadline", "type": "Option:u64"}
            ],
            "outputs": []
        },
        {
            "name": "getReserves",
            "mutability": "readonly",
            "inputs": [],
            "outputs": [{"type": "Reserves"}]
        },
        {
            "name": "getState",
            "mutability": "readonly",
            "inputs": [],
            "outputs": [{"type": "State"}]
        },
        {
            "name": "getFeeHistory",
            "mutability": "readonly",
            "inputs": [],
            "outputs": [{"type": "List<tuple<u64,BigUint>>"}]
        }
    ],
    "types": {
        "Reserves": {
            "type": "struct",
            "fields": [
                {"name": "first", "type": "BigUint"},
                {"name": "second", "type": "BigUint"},
                {"name": "updated_at_block", "type": "u64"}
            ]
        },
        "State": {
            "type": "enum",
            "variants": [
                {"name": "Inactive", "discriminant": 0},
                {"name": "Active", "discriminant": 1},
                {"name": "PartialActive", "discriminant": 2}
            ]
        }
    }
}"#;

fn klv_address(fill: u8) -> String {
    let hrp = bech32::Hrp::parse("klv").unwrap();
    bech32::encode::<bech32::Bech32>(hrp, &[fill; 32]).unwrap()
}

#[test]
fn test_primitive_encodings_match_wire_format() {
    assert_eq!(encode_value(&Value::U64(42), "u64").unwrap(), "2a");
    assert_eq!(encode_value(&Value::Bool(true), "bool").unwrap(), "01");
    assert_eq!(
        encode_value(&Value::big_uint("1000000").unwrap(), "BigUint").unwrap(),
        "0f4240"
    );
}

#[test]
fn test_address_round_trips_through_codec() {
    let addr = klv_address(0x5a);
    let hex_form = encode_value(&Value::Address(addr.clone()), "Address").unwrap();
    assert_eq!(hex_form.len(), 64);
    assert_eq!(
        decode_base_value(&hex_form, "Address").unwrap(),
        Value::Address(addr)
    );
}

#[test]
fn test_option_encoding_convention() {
    assert_eq!(
        encode_value(&Value::Option(None), "Option:u64").unwrap(),
        "00"
    );
    let some = encode_value(
        &Value::Option(Some(Box::new(Value::U64(5)))),
        "Option:u64",
    )
    .unwrap();
    assert!(some.starts_with("01"));
    assert_eq!(&some[2..], "05");
}

#[test]
fn test_call_data_for_add_liquidity() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();
    let endpoint = abi.endpoint("addLiquidity").unwrap();

    let args = [
        Value::big_uint("1000").unwrap(),
        Value::big_uint("2500").unwrap(),
        Value::Option(Some(Box::new(Value::U64(1_700_000_000)))),
    ];
    let encoded: Vec<_> = endpoint
        .inputs
        .iter()
        .zip(args.iter())
        .map(|(input, value)| encode_arg(value, &input.type_name).unwrap())
        .collect();

    let payload = build_call_data("addLiquidity", &encoded);
    let decoded = String::from_utf8(BASE64.decode(payload).unwrap()).unwrap();
    assert_eq!(decoded, "addLiquidity@03e8@09c4@016553f100");
}

#[test]
fn test_struct_return_decodes_at_field_boundaries() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();
    // first = 1000 (len 2), second = 2500 (len 2), updated_at_block = 77
    let hex_value = "0000000203e80000000209c4000000000000004d";
    let decoded = decode_return(&abi, hex_value, "getReserves")
        .unwrap()
        .unwrap();

    let Value::Struct(fields) = decoded.value else {
        panic!("expected struct");
    };
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], ("first".into(), Value::big_uint("1000").unwrap()));
    assert_eq!(fields[1], ("second".into(), Value::big_uint("2500").unwrap()));
    assert_eq!(fields[2], ("updated_at_block".into(), Value::U64(77)));
}

#[test]
fn test_enum_return_resolves_variant_name() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();
    let decoded = decode_return(&abi, "02", "getState").unwrap().unwrap();
    assert_eq!(
        decoded.value,
        Value::Enum {
            name: "PartialActive".into(),
            discriminant: 2
        }
    );

    assert!(decode_return(&abi, "07", "getState").is_err());
}

#[test]
fn test_list_of_tuples_return() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();
    // two entries: (epoch u64, fee BigUint len-prefixed)
    let hex_value = concat!(
        "00000002",
        "0000000000000001", "0000000103",
        "0000000000000002", "0000000105",
    );
    let decoded = decode_return(&abi, hex_value, "getFeeHistory")
        .unwrap()
        .unwrap();

    let Value::List(items) = decoded.value else {
        panic!("expected list");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0],
        Value::Struct(vec![
            ("_0".into(), Value::U64(1)),
            ("_1".into(), Value::big_uint("3").unwrap()),
        ])
    );
}

#[test]
fn test_query_response_feeds_the_decoder() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();

    // node transports return slots as base64 over the raw bytes
    let raw = hex::decode("0000000203e80000000209c4000000000000004d").unwrap();
    let response: QueryResponse = serde_json::from_value(serde_json::json!({
        "returnData": [BASE64.encode(raw)],
        "returnCode": "Ok"
    }))
    .unwrap();

    let slots = response.return_data_hex().unwrap();
    let decoded = decode_return(&abi, &slots[0], "getReserves")
        .unwrap()
        .unwrap();
    let json = decoded.value.to_json();
    assert_eq!(json["first"], "1000");
    assert_eq!(json["second"], "2500");
    assert_eq!(json["updated_at_block"], 77);
}

#[test]
fn test_variadic_wrapper_is_transparent() {
    let abi = AbiDocument::from_json(PAIR_ABI).unwrap();
    assert_eq!(
        decode_value(&abi, "2a", "variadic<u64>").unwrap(),
        Value::U64(42)
    );
}
