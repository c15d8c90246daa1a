/// 동적 JSON 설정 검증에 사용되는 JSON 스키마입니다.
///
/// 스키마는 JSON Schema Draft 7을 따릅니다.
pub const CONFIG_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["version"],
    "properties": {
        "version": {
            "type": "string",
            "enum": ["1.0"]
        },
        "id": {
            "type": "string"
        },
        "middlewares": {
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": {
                        "type": "string",
                        "enum": ["basic-auth", "headers", "rate-limit", "strip-prefix", "cors"]
                    },
                    "enabled": {"type": "boolean"},
                    "order": {"type": "integer"},
                    "settings": {"type": "object"}
                }
            }
        },
        "routers": {
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "required": ["rule", "service"],
                "properties": {
                    "rule": {"type": "string"},
                    "service": {"type": "string"},
                    "middlewares": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "priority": {"type": "integer"}
                }
            }
        },
        "services": {
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "required": ["loadbalancer"],
                "properties": {
                    "loadbalancer": {
                        "type": "object",
                        "required": ["servers"],
                        "properties": {
                            "strategy": {
                                "type": "string",
                                "enum": ["round-robin", "weighted"]
                            },
                            "servers": {
                                "type": "array",
                                "minItems": 1,
                                "items": {
                                    "type": "object",
                                    "required": ["url"],
                                    "properties": {
                                        "url": {"type": "string", "format": "uri"},
                                        "weight": {"type": "integer", "minimum": 1}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}"#;
